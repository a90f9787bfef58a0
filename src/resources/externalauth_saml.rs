//! `wallix-bastion_externalauth_saml`: a SAML identity provider.
//!
//! The service-provider side (`sp_*`, `saml_request_*`) is generated by the
//! appliance and only ever read back.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::versions_38_plus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const EXTERNAL_AUTHS: NamedCollection = NamedCollection::new("/externalauths/", "authentication_name");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonExternalAuthSaml {
    timeout: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    authentication_name: String,
    certificate: String,
    description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    idp_entity_id: String,
    idp_metadata: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    passphrase: String,
    private_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    saml_request_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    saml_request_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    sp_assertion_consumer_service: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    sp_entity_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    sp_metadata: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    sp_single_logout_service: String,
    #[serde(rename = "type")]
    kind: String,
}

has_id!(JsonExternalAuthSaml);

const GENERATED: [&str; 7] = [
    "idp_entity_id",
    "saml_request_url",
    "saml_request_method",
    "sp_metadata",
    "sp_entity_id",
    "sp_assertion_consumer_service",
    "sp_single_logout_service",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalAuthSamlResource;

impl ExternalAuthSamlResource {
    fn payload(d: &ResourceData) -> JsonExternalAuthSaml {
        JsonExternalAuthSaml {
            authentication_name: d.get_string("authentication_name"),
            idp_metadata: d.get_string("idp_metadata"),
            timeout: d.get_float("timeout"),
            certificate: d.get_string("certificate"),
            description: d.get_string("description"),
            passphrase: d.get_string("passphrase"),
            private_key: d.get_string("private_key"),
            kind: "SAML".to_string(),
            ..JsonExternalAuthSaml::default()
        }
    }

    fn fill(d: &mut ResourceData, json: JsonExternalAuthSaml) -> Result<()> {
        d.set("authentication_name", json.authentication_name)?;
        d.set("idp_metadata", json.idp_metadata)?;
        d.set("timeout", json.timeout)?;
        d.set("description", json.description)?;
        d.set("idp_entity_id", json.idp_entity_id)?;
        d.set("saml_request_url", json.saml_request_url)?;
        d.set("saml_request_method", json.saml_request_method)?;
        d.set("sp_metadata", json.sp_metadata)?;
        d.set("sp_entity_id", json.sp_entity_id)?;
        d.set("sp_assertion_consumer_service", json.sp_assertion_consumer_service)?;
        d.set("sp_single_logout_service", json.sp_single_logout_service)
    }
}

#[async_trait]
impl Resource for ExternalAuthSamlResource {
    fn name(&self) -> &'static str {
        "externalauth_saml"
    }

    fn schema(&self) -> Schema {
        let schema = Schema::new()
            .with_attribute("authentication_name", Attribute::string().required())
            .with_attribute("idp_metadata", Attribute::string().required())
            .with_attribute("timeout", Attribute::float().required().float_between(1.0, 900.0))
            .with_attribute("certificate", Attribute::string().optional().sensitive())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "passphrase",
                Attribute::string().optional().sensitive().required_with(&["private_key"]),
            )
            .with_attribute("private_key", Attribute::string().optional().sensitive());
        GENERATED
            .iter()
            .fold(schema, |schema, key| schema.with_attribute(*key, Attribute::string().computed()))
    }

    fn versions(&self) -> &'static [&'static str] {
        versions_38_plus()
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        EXTERNAL_AUTHS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match EXTERNAL_AUTHS.fetch::<JsonExternalAuthSaml>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
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
    fn test_generated_fields_are_not_sent() {
        let d = ResourceData::from_config(
            ExternalAuthSamlResource.schema(),
            json!({"authentication_name": "idp", "idp_metadata": "<xml/>", "timeout": 30.0})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let payload = serde_json::to_value(ExternalAuthSamlResource::payload(&d)).unwrap();
        for key in GENERATED {
            assert!(payload.get(key).is_none(), "{key} sent");
        }
        assert_eq!(payload["type"], "SAML");
    }

    #[test]
    fn test_passphrase_needs_private_key() {
        let schema = ExternalAuthSamlResource.schema();
        let config = json!({"authentication_name": "idp", "idp_metadata": "<xml/>", "timeout": 30.0, "passphrase": "p"});
        assert!(schema.validate(config.as_object().unwrap()).has_errors());
    }
}
