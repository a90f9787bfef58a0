//! `wallix-bastion_externalauth_tacacs`

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const EXTERNAL_AUTHS: NamedCollection =
    NamedCollection::new("/externalauths/", "authentication_name").scanned();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonExternalAuthTacacs {
    port: i64,
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

has_id!(JsonExternalAuthTacacs);

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalAuthTacacsResource;

impl ExternalAuthTacacsResource {
    fn payload(d: &ResourceData) -> JsonExternalAuthTacacs {
        JsonExternalAuthTacacs {
            authentication_name: d.get_string("authentication_name"),
            host: d.get_string("host"),
            port: d.get_int("port"),
            secret: d.get_string("secret"),
            description: d.get_string("description"),
            use_primary_auth_domain: d.get_bool("use_primary_auth_domain"),
            kind: "TACACS+".to_string(),
            ..JsonExternalAuthTacacs::default()
        }
    }
}

#[async_trait]
impl Resource for ExternalAuthTacacsResource {
    fn name(&self) -> &'static str {
        "externalauth_tacacs"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("authentication_name", Attribute::string().required())
            .with_attribute("host", Attribute::string().required())
            .with_attribute("port", Attribute::int().required().int_between(1, 65535))
            .with_attribute("secret", Attribute::string().required().sensitive())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("use_primary_auth_domain", Attribute::bool().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        EXTERNAL_AUTHS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match EXTERNAL_AUTHS.fetch::<JsonExternalAuthTacacs>(client, d.id()).await? {
            Some(json) => {
                d.set("authentication_name", json.authentication_name)?;
                d.set("host", json.host)?;
                d.set("port", json.port)?;
                d.set("description", json.description)?;
                d.set("use_primary_auth_domain", json.use_primary_auth_domain)
            }
            None => {
                d.set_id("");
                Ok(())
            }
        }
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
    fn test_payload_type() {
        let d = ResourceData::from_config(
            ExternalAuthTacacsResource.schema(),
            json!({"authentication_name": "t", "host": "tac", "port": 49, "secret": "s"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let payload = serde_json::to_value(ExternalAuthTacacsResource::payload(&d)).unwrap();
        assert_eq!(payload["type"], "TACACS+");
        assert_eq!(payload["secret"], "s");
    }
}
