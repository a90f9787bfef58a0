//! `wallix-bastion_device_localdomain`: domains local to one device.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{already_exists, ca_private_key, device, not_found_after_post, split_import_id, JsonPasswordChange};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDeviceLocalDomain {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    domain_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    ca_private_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    ca_public_key: String,
    description: String,
    passphrase: String,
    #[serde(flatten)]
    password_change: JsonPasswordChange,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceLocalDomainResource;

/// ID of the local domain `domain_name` on `device_id`
pub(crate) async fn search(client: &BastionClient, device_id: &str, domain_name: &str) -> Result<Option<String>> {
    client
        .search_by_scan(&format!("/devices/{device_id}/localdomains/"), "domain_name", domain_name)
        .await
}

/// Fail unless the local domain exists on the device
pub(crate) async fn ensure_exists(client: &BastionClient, device_id: &str, domain_id: &str) -> Result<()> {
    super::ensure_parent(
        client,
        "domain_id",
        &format!("/devices/{device_id}/localdomains/{domain_id}"),
        &format!("{domain_id} on device_id {device_id}"),
    )
    .await
}

impl DeviceLocalDomainResource {
    fn payload(d: &ResourceData, new_resource: bool) -> Result<JsonDeviceLocalDomain> {
        Ok(JsonDeviceLocalDomain {
            domain_name: d.get_string("domain_name"),
            ca_private_key: ca_private_key(d),
            description: d.get_string("description"),
            passphrase: d.get_string("passphrase"),
            password_change: JsonPasswordChange::from_data(d, new_resource)?,
            ..JsonDeviceLocalDomain::default()
        })
    }

    fn uri(d: &ResourceData) -> String {
        format!("/devices/{}/localdomains/{}", d.get_string("device_id"), d.id())
    }
}

#[async_trait]
impl Resource for DeviceLocalDomainResource {
    fn name(&self) -> &'static str {
        "device_localdomain"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("device_id", Attribute::string().required().force_new())
            .with_attribute("domain_name", Attribute::string().required())
            .with_attribute(
                "admin_account",
                Attribute::string().optional().required_with(&[
                    "enable_password_change",
                    "password_change_policy",
                    "password_change_plugin",
                ]),
            )
            .with_attribute("ca_public_key", Attribute::string().computed())
            .with_attribute("ca_private_key", Attribute::string().optional().sensitive())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "enable_password_change",
                Attribute::bool()
                    .optional()
                    .required_with(&["password_change_policy", "password_change_plugin"]),
            )
            .with_attribute("passphrase", Attribute::string().optional().sensitive())
            .with_attribute(
                "password_change_policy",
                Attribute::string().optional().required_with(&["enable_password_change"]),
            )
            .with_attribute(
                "password_change_plugin",
                Attribute::string().optional().required_with(&["enable_password_change"]),
            )
            .with_attribute(
                "password_change_plugin_parameters",
                Attribute::string().optional().sensitive().json().required_with(&[
                    "enable_password_change",
                    "password_change_policy",
                    "password_change_plugin",
                ]),
            )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let device_id = d.get_string("device_id");
        let domain_name = d.get_string("domain_name");
        device::ensure_exists(client, &device_id).await?;
        if search(client, &device_id, &domain_name).await?.is_some() {
            return Err(already_exists(
                "domain_name",
                format!("{domain_name} on device_id {device_id}"),
            ));
        }
        client
            .post(&format!("/devices/{device_id}/localdomains/"), &Self::payload(d, true)?)
            .await?;
        let id = search(client, &device_id, &domain_name)
            .await?
            .ok_or_else(|| not_found_after_post("domain_name", format!("{domain_name} on device_id {device_id}")))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match client.get_json::<JsonDeviceLocalDomain>(&Self::uri(d)).await? {
            Some(json) if !json.id.is_empty() => {
                d.set("domain_name", json.domain_name)?;
                d.set("ca_public_key", json.ca_public_key)?;
                d.set("description", json.description)?;
                json.password_change.fill(d)
            }
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client.put(&Self::uri(d), &Self::payload(d, false)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client.delete(&Self::uri(d)).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<device_id>/<domain_name>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 2, EXPECTED)?;
        let id = search(client, parts[0], parts[1])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "domain_name",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("device_id", parts[0])?;
        d.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_skips_password_change_when_disabled() {
        let d = ResourceData::from_config(
            DeviceLocalDomainResource.schema(),
            json!({"device_id": "d1", "domain_name": "local", "password_change_policy": "p"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let payload = serde_json::to_value(DeviceLocalDomainResource::payload(&d, true).unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({"domain_name": "local", "description": "", "passphrase": "", "enable_password_change": false})
        );
        assert_eq!(DeviceLocalDomainResource::uri(&d), "/devices/d1/localdomains/");
    }
}
