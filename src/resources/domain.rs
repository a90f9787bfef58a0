//! `wallix-bastion_domain`: global domains holding shared accounts.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collection::{has_id, NamedCollection};
use super::{ca_private_key, parse_json_object, JsonPasswordChange};

const DOMAINS: NamedCollection = NamedCollection::new("/domains/", "domain_name").scanned();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JsonDomain {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub domain_name: String,
    pub domain_real_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ca_private_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ca_public_key: String,
    pub description: String,
    pub passphrase: String,
    #[serde(flatten)]
    pub password_change: JsonPasswordChange,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vault_plugin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_plugin_parameters: Option<Map<String, Value>>,
}

has_id!(JsonDomain);

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainResource;

impl DomainResource {
    fn payload(d: &ResourceData, new_resource: bool) -> Result<JsonDomain> {
        let mut json = JsonDomain {
            domain_name: d.get_string("domain_name"),
            domain_real_name: d.get_string("domain_real_name"),
            ca_private_key: ca_private_key(d),
            description: d.get_string("description"),
            passphrase: d.get_string("passphrase"),
            password_change: JsonPasswordChange::from_data(d, new_resource)?,
            ..JsonDomain::default()
        };
        let vault_plugin = d.get_string("vault_plugin");
        if !json.password_change.enable_password_change && !vault_plugin.is_empty() {
            json.vault_plugin = vault_plugin;
            json.vault_plugin_parameters = Some(parse_json_object(
                "vault_plugin_parameters",
                &d.get_string("vault_plugin_parameters"),
            )?);
        }
        Ok(json)
    }
}

/// ID of the global domain named `domain_name`
pub(crate) async fn search(client: &BastionClient, domain_name: &str) -> Result<Option<String>> {
    DOMAINS.search(client, domain_name).await
}

/// Global domain by ID; `None` when it does not exist
pub(crate) async fn fetch(client: &BastionClient, id: &str) -> Result<Option<JsonDomain>> {
    DOMAINS.fetch(client, id).await
}

/// Fail unless the global domain exists
pub(crate) async fn ensure_exists(client: &BastionClient, domain_id: &str) -> Result<()> {
    super::ensure_parent(client, "domain_id", &DOMAINS.object_uri(domain_id), domain_id).await
}

#[async_trait]
impl Resource for DomainResource {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_name", Attribute::string().required())
            .with_attribute("domain_real_name", Attribute::string().optional())
            .with_attribute(
                "admin_account",
                Attribute::string().optional().required_with(&[
                    "enable_password_change",
                    "password_change_policy",
                    "password_change_plugin",
                ]),
            )
            .with_attribute("ca_public_key", Attribute::string().computed())
            .with_attribute(
                "ca_private_key",
                Attribute::string().optional().sensitive().conflicts_with(&["vault_plugin"]),
            )
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "enable_password_change",
                Attribute::bool()
                    .optional()
                    .required_with(&["password_change_policy", "password_change_plugin"])
                    .conflicts_with(&["vault_plugin"]),
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
                Attribute::string()
                    .optional()
                    .sensitive()
                    .json()
                    .required_with(&[
                        "enable_password_change",
                        "password_change_policy",
                        "password_change_plugin",
                    ]),
            )
            .with_attribute(
                "vault_plugin",
                Attribute::string()
                    .optional()
                    .force_new()
                    .conflicts_with(&["enable_password_change", "ca_private_key"]),
            )
            .with_attribute(
                "vault_plugin_parameters",
                Attribute::string()
                    .optional()
                    .sensitive()
                    .json()
                    .required_with(&["vault_plugin"]),
            )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d, true)?;
        DOMAINS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = fetch(client, d.id()).await? else {
            d.set_id("");
            return Ok(());
        };
        d.set("domain_name", json.domain_name)?;
        d.set("domain_real_name", json.domain_real_name)?;
        d.set("ca_public_key", json.ca_public_key)?;
        d.set("description", json.description)?;
        json.password_change.fill(d)?;
        d.set("vault_plugin", json.vault_plugin)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        DOMAINS.update(client, d, &Self::payload(d, false)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        DOMAINS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        DOMAINS.import(client, d, "<domain_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(config: Value) -> ResourceData {
        ResourceData::from_config(DomainResource.schema(), config.as_object().cloned().unwrap())
    }

    #[test]
    fn test_password_change_payload() {
        let d = data(json!({
            "domain_name": "corp",
            "enable_password_change": true,
            "password_change_policy": "default",
            "password_change_plugin": "Unix",
            "admin_account": "root",
            "ca_private_key": "generate:RSA_4096"
        }));
        let payload = serde_json::to_value(DomainResource::payload(&d, true).unwrap()).unwrap();
        assert_eq!(payload["enable_password_change"], true);
        assert_eq!(payload["password_change_plugin_parameters"], json!({}));
        assert!(payload.get("admin_account").is_none());
        assert_eq!(payload["ca_private_key"], "generate:RSA_4096");
        assert!(payload.get("vault_plugin").is_none());

        let payload = serde_json::to_value(DomainResource::payload(&d, false).unwrap()).unwrap();
        assert_eq!(payload["admin_account"], "root");
    }

    #[test]
    fn test_generated_key_not_sent_again() {
        let prior = json!({"id": "1", "domain_name": "corp", "ca_private_key": "generate:RSA_4096"});
        let config = json!({"domain_name": "corp", "ca_private_key": "generate:RSA_4096", "description": "x"});
        let d = ResourceData::for_update(
            DomainResource.schema(),
            prior.as_object().cloned().unwrap(),
            config.as_object().cloned().unwrap(),
        );
        let payload = serde_json::to_value(DomainResource::payload(&d, false).unwrap()).unwrap();
        assert!(payload.get("ca_private_key").is_none());
    }

    #[test]
    fn test_vault_plugin_payload() {
        let d = data(json!({"domain_name": "corp", "vault_plugin": "cyberark", "vault_plugin_parameters": "{\"k\":\"v\"}"}));
        let payload = serde_json::to_value(DomainResource::payload(&d, true).unwrap()).unwrap();
        assert_eq!(payload["vault_plugin"], "cyberark");
        assert_eq!(payload["vault_plugin_parameters"], json!({"k": "v"}));
        assert_eq!(payload["enable_password_change"], false);
    }

    #[test]
    fn test_vault_plugin_conflicts_with_password_change() {
        let diags = DomainResource.schema().validate(
            json!({"domain_name": "corp", "vault_plugin": "x", "enable_password_change": true,
                   "password_change_policy": "p", "password_change_plugin": "q"})
            .as_object()
            .unwrap(),
        );
        assert!(diags.has_errors());
    }
}
