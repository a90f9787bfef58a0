//! # Resources
//!
//! One adapter per Bastion object type. Every adapter follows the same shape:
//!
//! - `create`: refuse an existing object with the same name, POST, then look
//!   the new object up again to learn its ID
//! - `read`: GET by ID, a 404 clears the ID
//! - `update`: PUT (with `?force=true` where the API needs it)
//! - `delete`: DELETE
//! - `import`: resolve a human readable import ID (`<parent_id>/<name>`) to
//!   the object ID
//!
//! Payload structs mirror the wire format exactly; `skip_serializing_if`
//! stands in for fields the API wants omitted rather than empty.

pub mod application;
pub mod application_localdomain;
pub mod application_localdomain_account;
pub(crate) mod authdomain;
pub mod authdomain_ad;
pub mod authdomain_azuread;
pub mod authdomain_ldap;
pub mod authdomain_mapping;
pub mod authdomain_saml;
pub mod authorization;
pub mod checkout_policy;
pub mod cluster;
mod collection;
pub mod config_x509;
pub mod connection_message;
pub mod connection_policy;
mod credential;
pub mod device;
pub mod device_localdomain;
pub mod device_localdomain_account;
pub mod device_localdomain_account_credential;
pub mod device_service;
pub mod domain;
pub mod domain_account;
pub mod domain_account_credential;
pub mod encryption;
pub mod externalauth_kerberos;
pub mod externalauth_ldap;
pub mod externalauth_radius;
pub mod externalauth_saml;
pub mod externalauth_tacacs;
pub mod ldapdomain;
pub mod ldapmapping;
pub mod profile;
pub mod targetgroup;
pub mod timeframe;
pub mod user;
pub mod usergroup;

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every resource adapter shipped with the crate
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(application::ApplicationResource),
        Box::new(application_localdomain::ApplicationLocalDomainResource),
        Box::new(application_localdomain_account::ApplicationLocalDomainAccountResource),
        Box::new(authdomain_ad::AuthDomainAdResource),
        Box::new(authdomain_azuread::AuthDomainAzureAdResource),
        Box::new(authdomain_ldap::AuthDomainLdapResource),
        Box::new(authdomain_mapping::AuthDomainMappingResource),
        Box::new(authdomain_saml::AuthDomainSamlResource),
        Box::new(authorization::AuthorizationResource),
        Box::new(checkout_policy::CheckoutPolicyResource),
        Box::new(cluster::ClusterResource),
        Box::new(config_x509::ConfigX509Resource),
        Box::new(connection_message::ConnectionMessageResource),
        Box::new(connection_policy::ConnectionPolicyResource),
        Box::new(device::DeviceResource),
        Box::new(device_localdomain::DeviceLocalDomainResource),
        Box::new(device_localdomain_account::DeviceLocalDomainAccountResource),
        Box::new(device_localdomain_account_credential::DeviceLocalDomainAccountCredentialResource),
        Box::new(device_service::DeviceServiceResource),
        Box::new(domain::DomainResource),
        Box::new(domain_account::DomainAccountResource),
        Box::new(domain_account_credential::DomainAccountCredentialResource),
        Box::new(encryption::EncryptionResource),
        Box::new(externalauth_kerberos::ExternalAuthKerberosResource),
        Box::new(externalauth_ldap::ExternalAuthLdapResource),
        Box::new(externalauth_radius::ExternalAuthRadiusResource),
        Box::new(externalauth_saml::ExternalAuthSamlResource),
        Box::new(externalauth_tacacs::ExternalAuthTacacsResource),
        Box::new(ldapdomain::LdapDomainResource),
        Box::new(ldapmapping::LdapMappingResource),
        Box::new(profile::ProfileResource),
        Box::new(targetgroup::TargetGroupResource),
        Box::new(timeframe::TimeframeResource),
        Box::new(user::UserResource),
        Box::new(usergroup::UserGroupResource),
    ]
}

/// Session restriction shared by user groups and target groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JsonRestriction {
    pub action: String,
    pub rules: String,
    pub subprotocol: String,
}

/// Account credential as exchanged with the accounts and credentials endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JsonCredential {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub passphrase: String,
}

/// Actions accepted in session restrictions
pub(crate) const RESTRICTION_ACTIONS: [&str; 2] = ["kill", "notify"];

/// Subprotocols accepted in session restrictions
pub(crate) const RESTRICTION_SUBPROTOCOLS: [&str; 8] = [
    "SSH_SHELL_SESSION",
    "SSH_REMOTE_COMMAND",
    "SSH_SCP_UP",
    "SSH_SCP_DOWN",
    "SFTP_SESSION",
    "RLOGIN",
    "TELNET",
    "RDP",
];

/// Nested schema of a `restrictions` block
pub(crate) fn restrictions_schema() -> Schema {
    Schema::new()
        .with_attribute("action", Attribute::string().required().one_of(&RESTRICTION_ACTIONS))
        .with_attribute("rules", Attribute::string().required())
        .with_attribute("subprotocol", Attribute::string().required().one_of(&RESTRICTION_SUBPROTOCOLS))
}

/// Prefix asking the appliance to generate a key (`generate:RSA_4096`)
pub(crate) const GENERATE_KEY_PREFIX: &str = "generate:";

/// Password rotation settings shared by global and local domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct JsonPasswordChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_account: Option<String>,
    pub enable_password_change: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password_change_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password_change_plugin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_change_plugin_parameters: Option<Map<String, Value>>,
}

impl JsonPasswordChange {
    /// Settings sent when `enable_password_change` is on; `admin_account`
    /// only exists once the domain does, so it is left out on create.
    pub(crate) fn from_data(d: &ResourceData, new_resource: bool) -> Result<Self> {
        if !d.get_bool("enable_password_change") {
            return Ok(Self::default());
        }
        Ok(Self {
            admin_account: (!new_resource).then(|| d.get_string("admin_account")),
            enable_password_change: true,
            password_change_policy: d.get_string("password_change_policy"),
            password_change_plugin: d.get_string("password_change_plugin"),
            password_change_plugin_parameters: Some(parse_json_object(
                "password_change_plugin_parameters",
                &d.get_string("password_change_plugin_parameters"),
            )?),
        })
    }

    pub(crate) fn fill(&self, d: &mut ResourceData) -> Result<()> {
        d.set("admin_account", self.admin_account.clone().unwrap_or_default())?;
        d.set("enable_password_change", self.enable_password_change)?;
        d.set("password_change_policy", &self.password_change_policy)?;
        d.set("password_change_plugin", &self.password_change_plugin)
    }
}

/// CA private key to send.
///
/// A `generate:<ALGO>` request is only sent when the key was previously
/// empty; once generated, the appliance keeps the key it made.
pub(crate) fn ca_private_key(d: &ResourceData) -> String {
    let key = d.get_string("ca_private_key");
    if !key.starts_with(GENERATE_KEY_PREFIX) {
        return key;
    }
    let (old, _) = d.get_change("ca_private_key");
    if old.as_str().unwrap_or_default().is_empty() {
        key
    } else {
        String::new()
    }
}

pub(crate) fn already_exists(field: &'static str, name: impl Into<String>) -> BastionError {
    BastionError::AlreadyExists {
        field,
        name: name.into(),
    }
}

pub(crate) fn not_found_after_post(field: &'static str, name: impl Into<String>) -> BastionError {
    BastionError::NotFoundAfterPost {
        field,
        name: name.into(),
    }
}

/// Split an import ID into exactly `parts` non-empty segments
pub(crate) fn split_import_id<'a>(id: &'a str, parts: usize, expected: &'static str) -> Result<Vec<&'a str>> {
    let segments: Vec<&str> = id.split('/').collect();
    if segments.len() != parts || segments.iter().any(|s| s.is_empty()) {
        return Err(BastionError::ImportIdFormat { expected });
    }
    Ok(segments)
}

/// Fail unless a parent object exists, reading it with a GET
pub(crate) async fn ensure_parent(client: &BastionClient, parent: &'static str, uri: &str, id: &str) -> Result<()> {
    match client.get_json::<Value>(uri).await? {
        Some(_) => Ok(()),
        None => Err(BastionError::ParentNotFound {
            parent,
            id: id.to_string(),
        }),
    }
}

/// Decode a JSON-string attribute holding an object (plugin parameters, options)
pub(crate) fn parse_json_object(key: &str, raw: &str) -> Result<Map<String, Value>> {
    if raw.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(BastionError::validation(format!("{key} must be a JSON object"))),
        Err(e) => Err(BastionError::validation(format!("{key} contains an invalid JSON: {e}"))),
    }
}

/// Encode a free-form JSON value back into a string attribute
pub(crate) fn json_string(value: &Value) -> String {
    match value {
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

/// Treat an empty list as "not configured" for `*_if` payload fields
pub(crate) fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_import_id() {
        assert_eq!(split_import_id("a/b", 2, "<x>/<y>").unwrap(), vec!["a", "b"]);
        let err = split_import_id("a", 2, "<x>/<y>").unwrap_err();
        assert_eq!(err.to_string(), "id must be <x>/<y>");
        assert!(split_import_id("a//c", 3, "<x>/<y>/<z>").is_err());
    }

    #[test]
    fn test_parse_json_object() {
        assert!(parse_json_object("options", "").unwrap().is_empty());
        assert_eq!(parse_json_object("options", r#"{"a":1}"#).unwrap()["a"], json!(1));
        assert!(parse_json_object("options", "[1]").is_err());
        assert!(parse_json_object("options", "{").is_err());
    }

    #[test]
    fn test_credential_omits_empty_fields() {
        let cred = JsonCredential {
            kind: "password".to_string(),
            password: "s3cret".to_string(),
            ..JsonCredential::default()
        };
        assert_eq!(serde_json::to_value(&cred).unwrap(), json!({"type": "password", "password": "s3cret"}));
    }

    #[test]
    fn test_every_name_is_unique() {
        let mut names: Vec<&str> = all().iter().map(|r| r.name()).collect();
        let len = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), len);
    }
}
