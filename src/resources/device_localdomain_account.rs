//! `wallix-bastion_device_localdomain_account`: accounts of a device local domain.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    already_exists, credential, device, device_localdomain, not_found_after_post, split_import_id, JsonCredential,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDeviceLocalDomainAccount {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    account_name: String,
    account_login: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain_password_change: Option<bool>,
    auto_change_password: bool,
    auto_change_ssh_key: bool,
    checkout_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    certificate_validity: String,
    services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<Vec<JsonCredential>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceLocalDomainAccountResource;

/// ID of the account `account_name` in a device local domain
pub(crate) async fn search(
    client: &BastionClient,
    device_id: &str,
    domain_id: &str,
    account_name: &str,
) -> Result<Option<String>> {
    client
        .search_by_scan(
            &format!("/devices/{device_id}/localdomains/{domain_id}/accounts/"),
            "account_name",
            account_name,
        )
        .await
}

pub(crate) async fn ensure_exists(client: &BastionClient, device_id: &str, domain_id: &str, account_id: &str) -> Result<()> {
    super::ensure_parent(
        client,
        "account_id",
        &format!("/devices/{device_id}/localdomains/{domain_id}/accounts/{account_id}"),
        &format!("{account_id} on domain_id {domain_id}, device_id {device_id}"),
    )
    .await
}

impl DeviceLocalDomainAccountResource {
    fn payload(d: &ResourceData) -> JsonDeviceLocalDomainAccount {
        JsonDeviceLocalDomainAccount {
            account_name: d.get_string("account_name"),
            account_login: d.get_string("account_login"),
            checkout_policy: d.get_string("checkout_policy"),
            auto_change_password: d.get_bool("auto_change_password"),
            auto_change_ssh_key: d.get_bool("auto_change_ssh_key"),
            certificate_validity: d.get_string("certificate_validity"),
            description: d.get_string("description"),
            services: d.get_string_list("services"),
            ..JsonDeviceLocalDomainAccount::default()
        }
    }

    fn collection(d: &ResourceData) -> String {
        format!(
            "/devices/{}/localdomains/{}/accounts/",
            d.get_string("device_id"),
            d.get_string("domain_id")
        )
    }
}

#[async_trait]
impl Resource for DeviceLocalDomainAccountResource {
    fn name(&self) -> &'static str {
        "device_localdomain_account"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("device_id", Attribute::string().required().force_new())
            .with_attribute("domain_id", Attribute::string().required().force_new())
            .with_attribute("account_name", Attribute::string().required())
            .with_attribute("account_login", Attribute::string().required())
            .with_attribute("auto_change_password", Attribute::bool().optional())
            .with_attribute("auto_change_ssh_key", Attribute::bool().optional())
            .with_attribute("certificate_validity", Attribute::string().optional())
            .with_attribute("checkout_policy", Attribute::string().default("default"))
            .with_attribute("credentials", Attribute::block_list(credential::summary_schema()).computed())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("domain_password_change", Attribute::bool().computed())
            .with_attribute("services", Attribute::string_set().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let device_id = d.get_string("device_id");
        let domain_id = d.get_string("domain_id");
        let account_name = d.get_string("account_name");
        device::ensure_exists(client, &device_id).await?;
        device_localdomain::ensure_exists(client, &device_id, &domain_id).await?;
        let described = format!("{account_name} on domain_id {domain_id}, device_id {device_id}");
        if search(client, &device_id, &domain_id, &account_name).await?.is_some() {
            return Err(already_exists("account_name", described));
        }
        client.post(&Self::collection(d), &Self::payload(d)).await?;
        let id = search(client, &device_id, &domain_id, &account_name)
            .await?
            .ok_or_else(|| not_found_after_post("account_name", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}", Self::collection(d), d.id());
        match client.get_json::<JsonDeviceLocalDomainAccount>(&uri).await? {
            Some(json) if !json.id.is_empty() => {
                d.set("account_name", json.account_name)?;
                d.set("account_login", json.account_login)?;
                d.set("checkout_policy", json.checkout_policy)?;
                d.set("auto_change_password", json.auto_change_password)?;
                d.set("auto_change_ssh_key", json.auto_change_ssh_key)?;
                d.set("certificate_validity", json.certificate_validity)?;
                d.set("credentials", credential::summaries(json.credentials))?;
                d.set("description", json.description)?;
                d.set("domain_password_change", json.domain_password_change.unwrap_or_default())?;
                d.set("services", json.services)
            }
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}?force=true", Self::collection(d), d.id());
        client.put(&uri, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client
            .delete(&format!("{}{}", Self::collection(d), d.id()))
            .await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<device_id>/<domain_id>/<account_name>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 3, EXPECTED)?;
        let id = search(client, parts[0], parts[1], parts[2])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "account_name",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("device_id", parts[0])?;
        d.set("domain_id", parts[1])?;
        d.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_sends_empty_services() {
        let d = ResourceData::from_config(
            DeviceLocalDomainAccountResource.schema(),
            json!({"device_id": "d", "domain_id": "l", "account_name": "root", "account_login": "root"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let payload = serde_json::to_value(DeviceLocalDomainAccountResource::payload(&d)).unwrap();
        assert_eq!(payload["services"], json!([]));
        assert_eq!(payload["checkout_policy"], "default");
        assert!(payload.get("credentials").is_none());
        assert!(payload.get("certificate_validity").is_none());
    }
}
