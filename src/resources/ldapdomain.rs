//! `wallix-bastion_ldapdomain`: legacy LDAP user domain of API v3.3 and v3.6.
//!
//! Objects are addressed by `domain_name`, which is also the state ID.

use crate::client::BastionClient;
use crate::constants::LANGUAGES;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::versions_legacy_ldap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{already_exists, not_found_after_post};

const LDAP_DOMAINS: &str = "/ldapdomains/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonLdapDomain {
    check_x509_san_email: bool,
    is_default: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    domain_name: String,
    default_language: String,
    default_email_domain: String,
    description: String,
    display_name_attribute: String,
    email_attribute: String,
    ldap_domain_name: String,
    language_attribute: String,
    group_attribute: String,
    san_domain_name: String,
    x509_condition: String,
    x509_search_filter: String,
    external_ldaps: Vec<String>,
    secondary_auth: Vec<String>,
}

fn uri(domain_name: &str) -> String {
    format!("{LDAP_DOMAINS}{domain_name}")
}

async fn exists(client: &BastionClient, domain_name: &str) -> Result<bool> {
    Ok(client.get_json::<Value>(&uri(domain_name)).await?.is_some())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LdapDomainResource;

impl LdapDomainResource {
    /// `domain_name` cannot be renamed, so it is only sent on create
    fn payload(d: &ResourceData, new_resource: bool) -> JsonLdapDomain {
        JsonLdapDomain {
            check_x509_san_email: d.get_bool("check_x509_san_email"),
            is_default: d.get_bool("is_default"),
            domain_name: if new_resource {
                d.get_string("domain_name")
            } else {
                String::new()
            },
            default_language: d.get_string("default_language"),
            default_email_domain: d.get_string("default_email_domain"),
            description: d.get_string("description"),
            display_name_attribute: d.get_string("display_name_attribute"),
            email_attribute: d.get_string("email_attribute"),
            ldap_domain_name: d.get_string("ldap_domain_name"),
            language_attribute: d.get_string("language_attribute"),
            group_attribute: d.get_string("group_attribute"),
            san_domain_name: d.get_string("san_domain_name"),
            x509_condition: d.get_string("x509_condition"),
            x509_search_filter: d.get_string("x509_search_filter"),
            external_ldaps: d.get_string_list("external_ldaps"),
            secondary_auth: d.get_string_list("secondary_auth"),
        }
    }

    fn fill(d: &mut ResourceData, json: JsonLdapDomain) -> Result<()> {
        d.set("domain_name", json.domain_name)?;
        d.set("ldap_domain_name", json.ldap_domain_name)?;
        d.set("external_ldaps", json.external_ldaps)?;
        d.set("default_language", json.default_language)?;
        d.set("default_email_domain", json.default_email_domain)?;
        d.set("description", json.description)?;
        d.set("check_x509_san_email", json.check_x509_san_email)?;
        d.set("group_attribute", json.group_attribute)?;
        d.set("display_name_attribute", json.display_name_attribute)?;
        d.set("email_attribute", json.email_attribute)?;
        d.set("is_default", json.is_default)?;
        d.set("language_attribute", json.language_attribute)?;
        d.set("san_domain_name", json.san_domain_name)?;
        d.set("secondary_auth", json.secondary_auth)?;
        d.set("x509_condition", json.x509_condition)?;
        d.set("x509_search_filter", json.x509_search_filter)
    }
}

#[async_trait]
impl Resource for LdapDomainResource {
    fn name(&self) -> &'static str {
        "ldapdomain"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_name", Attribute::string().required().force_new())
            .with_attribute("ldap_domain_name", Attribute::string().required())
            .with_attribute("external_ldaps", Attribute::string_list().required())
            .with_attribute("default_language", Attribute::string().required().one_of(&LANGUAGES))
            .with_attribute("default_email_domain", Attribute::string().required())
            .with_attribute("secondary_auth", Attribute::string_list().optional())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("check_x509_san_email", Attribute::bool().optional())
            .with_attribute("display_name_attribute", Attribute::string().optional())
            .with_attribute("email_attribute", Attribute::string().optional())
            .with_attribute("group_attribute", Attribute::string().optional())
            .with_attribute("is_default", Attribute::bool().optional())
            .with_attribute("language_attribute", Attribute::string().optional())
            .with_attribute("san_domain_name", Attribute::string().optional())
            .with_attribute("x509_condition", Attribute::string().optional())
            .with_attribute("x509_search_filter", Attribute::string().optional())
    }

    fn versions(&self) -> &'static [&'static str] {
        versions_legacy_ldap()
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_name = d.get_string("domain_name");
        if exists(client, &domain_name).await? {
            return Err(already_exists("domain_name", domain_name));
        }
        client.post(LDAP_DOMAINS, &Self::payload(d, true)).await?;
        if !exists(client, &domain_name).await? {
            return Err(not_found_after_post("domain_name", domain_name));
        }
        d.set_id(domain_name);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match client.get_json::<JsonLdapDomain>(&uri(d.id())).await? {
            Some(json) if !json.domain_name.is_empty() => Self::fill(d, json),
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client
            .put(&format!("{}?force=true", uri(d.id())), &Self::payload(d, false))
            .await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client.delete(&uri(d.id())).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_name = d.id().to_string();
        if !exists(client, &domain_name).await? {
            return Err(BastionError::ImportNotFound {
                field: "domain_name",
                id: domain_name,
                expected: "<domain_name>",
            });
        }
        d.set("domain_name", domain_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> ResourceData {
        ResourceData::from_config(
            LdapDomainResource.schema(),
            json!({"domain_name": "corp", "ldap_domain_name": "corp.example.com", "external_ldaps": ["ldap1"],
                   "default_language": "en", "default_email_domain": "example.com"})
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[test]
    fn test_domain_name_only_sent_on_create() {
        let create = serde_json::to_value(LdapDomainResource::payload(&data(), true)).unwrap();
        assert_eq!(create["domain_name"], "corp");
        assert_eq!(create["secondary_auth"], json!([]));
        let update = serde_json::to_value(LdapDomainResource::payload(&data(), false)).unwrap();
        assert!(update.get("domain_name").is_none());
    }
}
