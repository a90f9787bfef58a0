//! `wallix-bastion_externalauth_ldap`

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const EXTERNAL_AUTHS: NamedCollection =
    NamedCollection::new("/externalauths/", "authentication_name").scanned();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonExternalAuthLdap {
    is_active_directory: bool,
    is_anonymous_access: bool,
    is_protected_user: bool,
    is_ssl: bool,
    is_starttls: bool,
    use_primary_auth_domain: bool,
    port: i64,
    timeout: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    authentication_name: String,
    ca_certificate: String,
    certificate: String,
    cn_attribute: String,
    description: String,
    ldap_base: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    login: String,
    login_attribute: String,
    host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    password: String,
    private_key: String,
    #[serde(rename = "type")]
    kind: String,
}

has_id!(JsonExternalAuthLdap);

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalAuthLdapResource;

impl ExternalAuthLdapResource {
    /// Binding needs credentials unless the directory allows anonymous access
    fn payload(d: &ResourceData) -> Result<JsonExternalAuthLdap> {
        let json = JsonExternalAuthLdap {
            is_active_directory: d.get_bool("is_active_directory"),
            is_anonymous_access: d.get_bool("is_anonymous_access"),
            is_protected_user: d.get_bool("is_protected_user"),
            is_ssl: d.get_bool("is_ssl"),
            is_starttls: d.get_bool("is_starttls"),
            use_primary_auth_domain: d.get_bool("use_primary_auth_domain"),
            timeout: d.get_float("timeout"),
            authentication_name: d.get_string("authentication_name"),
            ca_certificate: d.get_string("ca_certificate"),
            certificate: d.get_string("certificate"),
            cn_attribute: d.get_string("cn_attribute"),
            description: d.get_string("description"),
            ldap_base: d.get_string("ldap_base"),
            login: d.get_string("login"),
            login_attribute: d.get_string("login_attribute"),
            host: d.get_string("host"),
            password: d.get_string("password"),
            port: d.get_int("port"),
            private_key: d.get_string("private_key"),
            kind: "LDAP".to_string(),
            ..JsonExternalAuthLdap::default()
        };
        if !json.is_anonymous_access && (json.login.is_empty() || json.password.is_empty()) {
            return Err(BastionError::validation(format!(
                "missing 'login' and/or 'password' on externalauth_ldap {}",
                json.authentication_name
            )));
        }
        Ok(json)
    }

    // `password` is never returned
    fn fill(d: &mut ResourceData, json: JsonExternalAuthLdap) -> Result<()> {
        d.set("authentication_name", json.authentication_name)?;
        d.set("cn_attribute", json.cn_attribute)?;
        d.set("host", json.host)?;
        d.set("ldap_base", json.ldap_base)?;
        d.set("login", json.login)?;
        d.set("login_attribute", json.login_attribute)?;
        d.set("port", json.port)?;
        d.set("timeout", json.timeout)?;
        d.set("ca_certificate", json.ca_certificate)?;
        d.set("certificate", json.certificate)?;
        d.set("description", json.description)?;
        d.set("is_active_directory", json.is_active_directory)?;
        d.set("is_anonymous_access", json.is_anonymous_access)?;
        d.set("is_protected_user", json.is_protected_user)?;
        d.set("is_ssl", json.is_ssl)?;
        d.set("is_starttls", json.is_starttls)?;
        d.set("private_key", json.private_key)?;
        d.set("use_primary_auth_domain", json.use_primary_auth_domain)
    }
}

#[async_trait]
impl Resource for ExternalAuthLdapResource {
    fn name(&self) -> &'static str {
        "externalauth_ldap"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("authentication_name", Attribute::string().required())
            .with_attribute("cn_attribute", Attribute::string().required())
            .with_attribute("host", Attribute::string().required())
            .with_attribute("ldap_base", Attribute::string().required())
            .with_attribute("login_attribute", Attribute::string().required())
            .with_attribute("port", Attribute::int().required().int_between(1, 65535))
            .with_attribute("timeout", Attribute::float().required())
            .with_attribute("ca_certificate", Attribute::string().optional())
            .with_attribute("certificate", Attribute::string().optional())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("is_active_directory", Attribute::bool().optional())
            .with_attribute("is_anonymous_access", Attribute::bool().optional())
            .with_attribute("is_protected_user", Attribute::bool().optional())
            .with_attribute("is_ssl", Attribute::bool().optional())
            .with_attribute("is_starttls", Attribute::bool().optional())
            .with_attribute("login", Attribute::string().optional())
            .with_attribute("password", Attribute::string().optional().sensitive())
            .with_attribute("private_key", Attribute::string().optional())
            .with_attribute("use_primary_auth_domain", Attribute::bool().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d)?;
        EXTERNAL_AUTHS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match EXTERNAL_AUTHS.fetch::<JsonExternalAuthLdap>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.update(client, d, &Self::payload(d)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.import(client, d, "<authentication_name>").await
    }
}
