//! `wallix-bastion_externalauth_radius`

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const EXTERNAL_AUTHS: NamedCollection = NamedCollection::new("/externalauths/", "authentication_name");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonExternalAuthRadius {
    port: i64,
    timeout: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    authentication_name: String,
    description: String,
    host: String,
    secret: String,
    #[serde(rename = "type")]
    kind: String,
    use_primary_auth_domain: bool,
}

has_id!(JsonExternalAuthRadius);

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalAuthRadiusResource;

impl ExternalAuthRadiusResource {
    fn payload(d: &ResourceData) -> JsonExternalAuthRadius {
        JsonExternalAuthRadius {
            authentication_name: d.get_string("authentication_name"),
            host: d.get_string("host"),
            port: d.get_int("port"),
            secret: d.get_string("secret"),
            timeout: d.get_float("timeout"),
            description: d.get_string("description"),
            use_primary_auth_domain: d.get_bool("use_primary_auth_domain"),
            kind: "RADIUS".to_string(),
            ..JsonExternalAuthRadius::default()
        }
    }
}

#[async_trait]
impl Resource for ExternalAuthRadiusResource {
    fn name(&self) -> &'static str {
        "externalauth_radius"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("authentication_name", Attribute::string().required())
            .with_attribute("host", Attribute::string().required())
            .with_attribute("port", Attribute::int().required().int_between(1, 65535))
            .with_attribute("secret", Attribute::string().required().sensitive())
            .with_attribute("timeout", Attribute::float().required())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("use_primary_auth_domain", Attribute::bool().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        EXTERNAL_AUTHS.create(client, d, &payload).await
    }

    // The shared secret is write-only
    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = EXTERNAL_AUTHS
            .fetch::<JsonExternalAuthRadius>(client, d.id())
            .await?
        else {
            d.set_id("");
            return Ok(());
        };
        d.set("authentication_name", json.authentication_name)?;
        d.set("host", json.host)?;
        d.set("port", json.port)?;
        d.set("timeout", json.timeout)?;
        d.set("description", json.description)?;
        d.set("use_primary_auth_domain", json.use_primary_auth_domain)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.update(client, d, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.import(client, d, "<authentication_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_port_range() {
        let schema = ExternalAuthRadiusResource.schema();
        let config = json!({"authentication_name": "r", "host": "radius", "port": 70000, "secret": "s", "timeout": 5});
        assert!(schema.validate(config.as_object().unwrap()).has_errors());
    }
}
