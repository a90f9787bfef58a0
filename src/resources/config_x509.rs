//! `wallix-bastion_config_x509`: the appliance X509 configuration.
//!
//! A singleton without an ID of its own; state uses the fixed ID
//! [`CONFIG_X509_ID`].

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const URI: &str = "/config/x509";

pub const CONFIG_X509_ID: &str = "x509Config";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonConfigX509 {
    #[serde(skip_serializing_if = "String::is_empty")]
    ca_certificate: String,
    server_public_key: String,
    server_private_key: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    enable: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigX509Resource;

impl ConfigX509Resource {
    fn payload(d: &ResourceData) -> JsonConfigX509 {
        JsonConfigX509 {
            ca_certificate: d.get_string("ca_certificate"),
            server_public_key: d.get_string("server_public_key"),
            server_private_key: d.get_string("server_private_key"),
            enable: d.get_bool("enable"),
        }
    }
}

#[async_trait]
impl Resource for ConfigX509Resource {
    fn name(&self) -> &'static str {
        "config_x509"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("ca_certificate", Attribute::string().optional())
            .with_attribute("server_public_key", Attribute::string().required())
            .with_attribute("server_private_key", Attribute::string().required().sensitive())
            .with_attribute("enable", Attribute::bool().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client.post(URI, &Self::payload(d)).await?;
        d.set_id(CONFIG_X509_ID);
        Ok(())
    }

    /// No key pair configured means the resource is gone
    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let json = client.get_json::<JsonConfigX509>(URI).await?.unwrap_or_default();
        if json.server_public_key.is_empty() && json.server_private_key.is_empty() {
            d.set_id("");
            return Ok(());
        }
        d.set("ca_certificate", json.ca_certificate)?;
        d.set("server_public_key", json.server_public_key)?;
        d.set("server_private_key", json.server_private_key)?;
        d.set("enable", json.enable)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client.put(URI, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, _d: &ResourceData) -> Result<()> {
        client.delete(URI).await
    }

    async fn import(&self, _client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        d.set_id(CONFIG_X509_ID);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_omits_unset_ca_and_disabled_flag() {
        let d = ResourceData::from_config(
            ConfigX509Resource.schema(),
            json!({"server_public_key": "PUB", "server_private_key": "PRIV"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let payload = serde_json::to_value(ConfigX509Resource::payload(&d)).unwrap();
        assert_eq!(payload, json!({"server_public_key": "PUB", "server_private_key": "PRIV"}));
    }
}
