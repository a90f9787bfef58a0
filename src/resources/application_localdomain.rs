//! `wallix-bastion_application_localdomain`: domains local to one application.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{already_exists, not_found_after_post, split_import_id, JsonPasswordChange};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JsonApplicationLocalDomain {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub domain_name: String,
    pub description: String,
    #[serde(flatten)]
    pub password_change: JsonPasswordChange,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationLocalDomainResource;

pub(crate) async fn search(client: &BastionClient, application_id: &str, domain_name: &str) -> Result<Option<String>> {
    client
        .search_by_query(
            &format!("/applications/{application_id}/localdomains/"),
            "domain_name",
            domain_name,
        )
        .await
}

pub(crate) async fn ensure_exists(client: &BastionClient, application_id: &str, domain_id: &str) -> Result<()> {
    super::ensure_parent(
        client,
        "domain_id",
        &format!("/applications/{application_id}/localdomains/{domain_id}"),
        &format!("{domain_id} on application_id {application_id}"),
    )
    .await
}

impl ApplicationLocalDomainResource {
    fn payload(d: &ResourceData, new_resource: bool) -> Result<JsonApplicationLocalDomain> {
        Ok(JsonApplicationLocalDomain {
            domain_name: d.get_string("domain_name"),
            description: d.get_string("description"),
            password_change: JsonPasswordChange::from_data(d, new_resource)?,
            ..JsonApplicationLocalDomain::default()
        })
    }

    fn collection(d: &ResourceData) -> String {
        format!("/applications/{}/localdomains/", d.get_string("application_id"))
    }
}

#[async_trait]
impl Resource for ApplicationLocalDomainResource {
    fn name(&self) -> &'static str {
        "application_localdomain"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("application_id", Attribute::string().required().force_new())
            .with_attribute("domain_name", Attribute::string().required())
            .with_attribute(
                "admin_account",
                Attribute::string().optional().required_with(&["enable_password_change"]),
            )
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "enable_password_change",
                Attribute::bool().optional().required_with(&[
                    "password_change_policy",
                    "password_change_plugin",
                    "password_change_plugin_parameters",
                ]),
            )
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
                Attribute::string()
                    .optional()
                    .sensitive()
                    .json()
                    .required_with(&["enable_password_change"]),
            )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let application_id = d.get_string("application_id");
        let domain_name = d.get_string("domain_name");
        super::application::ensure_exists(client, &application_id).await?;
        let described = format!("{domain_name} on application_id {application_id}");
        if search(client, &application_id, &domain_name).await?.is_some() {
            return Err(already_exists("domain_name", described));
        }
        client
            .post(&Self::collection(d), &Self::payload(d, true)?)
            .await?;
        let id = search(client, &application_id, &domain_name)
            .await?
            .ok_or_else(|| not_found_after_post("domain_name", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}", Self::collection(d), d.id());
        match client.get_json::<JsonApplicationLocalDomain>(&uri).await? {
            Some(json) if !json.id.is_empty() => {
                d.set("domain_name", json.domain_name)?;
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
        let uri = format!("{}{}", Self::collection(d), d.id());
        client.put(&uri, &Self::payload(d, false)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client
            .delete(&format!("{}{}", Self::collection(d), d.id()))
            .await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<application_id>/<domain_name>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 2, EXPECTED)?;
        let id = search(client, parts[0], parts[1])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "domain_name",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("application_id", parts[0])?;
        d.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_account_sent_on_update_only() {
        let config = json!({
            "application_id": "app",
            "domain_name": "local",
            "admin_account": "admin",
            "enable_password_change": true,
            "password_change_policy": "default",
            "password_change_plugin": "Windows",
            "password_change_plugin_parameters": "{}"
        });
        let d = ResourceData::from_config(
            ApplicationLocalDomainResource.schema(),
            config.as_object().cloned().unwrap(),
        );
        let create = serde_json::to_value(ApplicationLocalDomainResource::payload(&d, true).unwrap()).unwrap();
        assert!(create.get("admin_account").is_none());
        let update = serde_json::to_value(ApplicationLocalDomainResource::payload(&d, false).unwrap()).unwrap();
        assert_eq!(update["admin_account"], "admin");
        assert_eq!(update["password_change_plugin_parameters"], json!({}));
    }
}
