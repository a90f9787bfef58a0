//! `wallix-bastion_connection_policy`

use crate::client::BastionClient;
use crate::constants::PROTOCOLS;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collection::{has_id, NamedCollection};
use super::{json_string, parse_json_object};

const CONNECTION_POLICIES: NamedCollection =
    NamedCollection::new("/connectionpolicies/", "connection_policy_name").scanned().forced();

const AUTHENTICATION_METHODS: [&str; 6] = [
    "KERBEROS_FORWARDING",
    "PASSWORD_INTERACTIVE",
    "PASSWORD_MAPPING",
    "PASSWORD_VAULT",
    "PUBKEY_AGENT_FORWARDING",
    "PUBKEY_VAULT",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonConnectionPolicy {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    connection_policy_name: String,
    description: String,
    protocol: String,
    options: Map<String, Value>,
    authentication_methods: Vec<String>,
}

has_id!(JsonConnectionPolicy);

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionPolicyResource;

impl ConnectionPolicyResource {
    fn payload(d: &ResourceData) -> Result<JsonConnectionPolicy> {
        let authentication_methods = d.get_string_list("authentication_methods");
        if let Some(invalid) = authentication_methods
            .iter()
            .find(|m| !AUTHENTICATION_METHODS.contains(&m.as_str()))
        {
            return Err(BastionError::validation(format!(
                "authentication_methods must be in {AUTHENTICATION_METHODS:?}, got {invalid}"
            )));
        }
        Ok(JsonConnectionPolicy {
            connection_policy_name: d.get_string("connection_policy_name"),
            description: d.get_string("description"),
            protocol: d.get_string("protocol"),
            options: parse_json_object("options", &d.get_string("options"))?,
            authentication_methods,
            ..JsonConnectionPolicy::default()
        })
    }
}

#[async_trait]
impl Resource for ConnectionPolicyResource {
    fn name(&self) -> &'static str {
        "connection_policy"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("connection_policy_name", Attribute::string().required())
            .with_attribute("protocol", Attribute::string().required().one_of(&PROTOCOLS))
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("authentication_methods", Attribute::string_set().optional())
            .with_attribute("options", Attribute::string().optional().json())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d)?;
        CONNECTION_POLICIES.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = CONNECTION_POLICIES
            .fetch::<JsonConnectionPolicy>(client, d.id())
            .await?
        else {
            d.set_id("");
            return Ok(());
        };
        d.set("connection_policy_name", json.connection_policy_name)?;
        d.set("description", json.description)?;
        d.set("protocol", json.protocol)?;
        d.set("authentication_methods", json.authentication_methods)?;
        d.set("options", json_string(&Value::Object(json.options)))
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        CONNECTION_POLICIES.update(client, d, &Self::payload(d)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        CONNECTION_POLICIES.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        CONNECTION_POLICIES
            .import(client, d, "<connection_policy_name>")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(config: serde_json::Value) -> ResourceData {
        ResourceData::from_config(ConnectionPolicyResource.schema(), config.as_object().cloned().unwrap())
    }

    #[test]
    fn test_options_default_to_empty_object() {
        let d = data(json!({"connection_policy_name": "ssh", "protocol": "SSH"}));
        let payload = serde_json::to_value(ConnectionPolicyResource::payload(&d).unwrap()).unwrap();
        assert_eq!(payload["options"], json!({}));
        assert_eq!(payload["authentication_methods"], json!([]));
    }

    #[test]
    fn test_rejects_unknown_authentication_method() {
        let d = data(json!({"connection_policy_name": "ssh", "protocol": "SSH",
                            "authentication_methods": ["PASSWORD_VAULT", "TOTP"]}));
        let err = ConnectionPolicyResource::payload(&d).unwrap_err();
        assert!(err.to_string().contains("TOTP"));
    }
}
