//! `wallix-bastion_authdomain_ad`: Active Directory authentication domains.

use crate::client::BastionClient;
use crate::constants::LANGUAGES;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::versions_38_plus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::authdomain;
use super::collection::has_id;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JsonAuthDomainAd {
    pub check_x509_san_email: bool,
    pub is_default: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub auth_domain_name: String,
    pub default_email_domain: String,
    pub default_language: String,
    pub description: String,
    pub display_name_attribute: String,
    pub domain_name: String,
    pub email_attribute: String,
    pub group_attribute: String,
    pub language_attribute: String,
    pub pubkey_attribute: String,
    pub san_domain_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x509_condition: String,
    pub x509_search_filter: String,
    pub external_auths: Vec<String>,
    pub secondary_auth: Vec<String>,
}

has_id!(JsonAuthDomainAd);

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDomainAdResource;

/// AD domain by ID
pub(crate) async fn fetch(client: &BastionClient, id: &str) -> Result<Option<JsonAuthDomainAd>> {
    authdomain::fetch::<JsonAuthDomainAd>(client, id).await
}

/// Payload shared with LDAP domains, which carry the same directory fields
pub(crate) fn directory_payload(d: &ResourceData, kind: &str) -> JsonAuthDomainAd {
    JsonAuthDomainAd {
        kind: kind.to_string(),
        domain_name: d.get_string("domain_name"),
        auth_domain_name: d.get_string("auth_domain_name"),
        default_email_domain: d.get_string("default_email_domain"),
        default_language: d.get_string("default_language"),
        description: d.get_string("description"),
        check_x509_san_email: d.get_bool("check_x509_san_email"),
        display_name_attribute: d.get_string("display_name_attribute"),
        email_attribute: d.get_string("email_attribute"),
        group_attribute: d.get_string("group_attribute"),
        is_default: d.get_bool("is_default"),
        language_attribute: d.get_string("language_attribute"),
        pubkey_attribute: d.get_string("pubkey_attribute"),
        san_domain_name: d.get_string("san_domain_name"),
        x509_condition: d.get_string("x509_condition"),
        x509_search_filter: d.get_string("x509_search_filter"),
        external_auths: d.get_string_list("external_auths"),
        secondary_auth: d.get_string_list("secondary_auth"),
        ..JsonAuthDomainAd::default()
    }
}

pub(crate) fn directory_fill(d: &mut ResourceData, json: JsonAuthDomainAd) -> Result<()> {
    d.set("domain_name", json.domain_name)?;
    d.set("auth_domain_name", json.auth_domain_name)?;
    d.set("external_auths", json.external_auths)?;
    d.set("default_language", json.default_language)?;
    d.set("default_email_domain", json.default_email_domain)?;
    d.set("description", json.description)?;
    d.set("check_x509_san_email", json.check_x509_san_email)?;
    d.set("group_attribute", json.group_attribute)?;
    d.set("display_name_attribute", json.display_name_attribute)?;
    d.set("email_attribute", json.email_attribute)?;
    d.set("is_default", json.is_default)?;
    d.set("language_attribute", json.language_attribute)?;
    d.set("pubkey_attribute", json.pubkey_attribute)?;
    d.set("san_domain_name", json.san_domain_name)?;
    d.set("secondary_auth", json.secondary_auth)?;
    d.set("x509_condition", json.x509_condition)?;
    d.set("x509_search_filter", json.x509_search_filter)
}

pub(crate) fn directory_schema() -> Schema {
    Schema::new()
        .with_attribute("domain_name", Attribute::string().required())
        .with_attribute("auth_domain_name", Attribute::string().required())
        .with_attribute("default_email_domain", Attribute::string().required())
        .with_attribute("default_language", Attribute::string().required().one_of(&LANGUAGES))
        .with_attribute("external_auths", Attribute::string_list().required())
        .with_attribute("description", Attribute::string().optional())
        .with_attribute("check_x509_san_email", Attribute::bool().optional())
        .with_attribute("display_name_attribute", Attribute::string().optional())
        .with_attribute("email_attribute", Attribute::string().optional())
        .with_attribute("group_attribute", Attribute::string().optional())
        .with_attribute("is_default", Attribute::bool().optional())
        .with_attribute("language_attribute", Attribute::string().optional())
        .with_attribute("pubkey_attribute", Attribute::string().optional())
        .with_attribute("san_domain_name", Attribute::string().optional())
        .with_attribute("secondary_auth", Attribute::string_list().optional())
        .with_attribute("x509_condition", Attribute::string().optional())
        .with_attribute("x509_search_filter", Attribute::string().optional())
}

#[async_trait]
impl Resource for AuthDomainAdResource {
    fn name(&self) -> &'static str {
        "authdomain_ad"
    }

    fn schema(&self) -> Schema {
        directory_schema()
    }

    fn versions(&self) -> &'static [&'static str] {
        versions_38_plus()
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = directory_payload(d, "AD");
        authdomain::create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match fetch(client, d.id()).await? {
            Some(json) => directory_fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        authdomain::update(client, d, &directory_payload(d, "AD")).await
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
    fn test_payload_carries_type_and_lists() {
        let d = ResourceData::from_config(
            AuthDomainAdResource.schema(),
            json!({
                "domain_name": "corp",
                "auth_domain_name": "corp.example.com",
                "default_email_domain": "example.com",
                "default_language": "en",
                "external_auths": ["ldap1"]
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let payload = serde_json::to_value(directory_payload(&d, "AD")).unwrap();
        assert_eq!(payload["type"], "AD");
        assert_eq!(payload["external_auths"], json!(["ldap1"]));
        assert_eq!(payload["secondary_auth"], json!([]));
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn test_gated_before_v38() {
        assert!(!AuthDomainAdResource.versions().contains(&"v3.6"));
        assert!(AuthDomainAdResource.versions().contains(&"v3.12"));
    }
}
