//! `wallix-bastion_authdomain_saml`

use crate::client::BastionClient;
use crate::constants::LANGUAGES;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::authdomain;
use super::collection::has_id;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonAuthDomainSaml {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    domain_name: String,
    #[serde(rename = "type")]
    kind: String,
    description: String,
    is_default: bool,
    auth_domain_name: String,
    external_auths: Vec<String>,
    secondary_auth: Vec<String>,
    default_language: String,
    default_email_domain: String,
    label: String,
    force_authn: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    idp_initiated_url: String,
}

has_id!(JsonAuthDomainSaml);

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDomainSamlResource;

impl AuthDomainSamlResource {
    fn payload(d: &ResourceData) -> JsonAuthDomainSaml {
        JsonAuthDomainSaml {
            kind: "SAML".to_string(),
            domain_name: d.get_string("domain_name"),
            description: d.get_string("description"),
            is_default: d.get_bool("is_default"),
            auth_domain_name: d.get_string("auth_domain_name"),
            default_language: d.get_string("default_language"),
            default_email_domain: d.get_string("default_email_domain"),
            label: d.get_string("label"),
            force_authn: d.get_bool("force_authn"),
            external_auths: d.get_string_list("external_auths"),
            secondary_auth: d.get_string_list("secondary_auth"),
            ..JsonAuthDomainSaml::default()
        }
    }

    fn fill(d: &mut ResourceData, json: JsonAuthDomainSaml) -> Result<()> {
        d.set("domain_name", json.domain_name)?;
        d.set("auth_domain_name", json.auth_domain_name)?;
        d.set("default_email_domain", json.default_email_domain)?;
        d.set("default_language", json.default_language)?;
        d.set("external_auths", json.external_auths)?;
        d.set("label", json.label)?;
        d.set("description", json.description)?;
        d.set("force_authn", json.force_authn)?;
        d.set("is_default", json.is_default)?;
        d.set("secondary_auth", json.secondary_auth)?;
        d.set("idp_initiated_url", json.idp_initiated_url)
    }
}

#[async_trait]
impl Resource for AuthDomainSamlResource {
    fn name(&self) -> &'static str {
        "authdomain_saml"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_name", Attribute::string().required())
            .with_attribute("auth_domain_name", Attribute::string().required())
            .with_attribute("default_email_domain", Attribute::string().required())
            .with_attribute("default_language", Attribute::string().required().one_of(&LANGUAGES))
            .with_attribute("external_auths", Attribute::string_list().required())
            .with_attribute("label", Attribute::string().required())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("force_authn", Attribute::bool().optional())
            .with_attribute("is_default", Attribute::bool().optional())
            .with_attribute("secondary_auth", Attribute::string_list().optional())
            .with_attribute("idp_initiated_url", Attribute::string().computed())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        authdomain::create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match authdomain::fetch::<JsonAuthDomainSaml>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        authdomain::update(client, d, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        authdomain::delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        authdomain::import(client, d).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_idp_url_is_read_only() {
        let d = ResourceData::from_config(
            AuthDomainSamlResource.schema(),
            json!({"domain_name": "saml", "auth_domain_name": "idp", "default_email_domain": "example.com",
                   "default_language": "en", "external_auths": ["saml"], "label": "SSO", "force_authn": true})
            .as_object()
            .cloned()
            .unwrap(),
        );
        let payload = serde_json::to_value(AuthDomainSamlResource::payload(&d)).unwrap();
        assert_eq!(payload["type"], "SAML");
        assert_eq!(payload["force_authn"], true);
        assert!(payload.get("idp_initiated_url").is_none());
    }

    #[test]
    fn test_fill_sets_idp_url() {
        let mut d = ResourceData::for_import(AuthDomainSamlResource.schema(), "id1");
        let json: JsonAuthDomainSaml = serde_json::from_value(json!({
            "id": "id1", "domain_name": "saml", "idp_initiated_url": "https://bastion/saml/idp"
        }))
        .unwrap();
        AuthDomainSamlResource::fill(&mut d, json).unwrap();
        assert_eq!(d.get_string("idp_initiated_url"), "https://bastion/saml/idp");
    }
}
