//! `wallix-bastion_authdomain_ldap`: LDAP authentication domains.
//!
//! Same directory fields as AD domains, only the `type` differs.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{ResourceData, Schema};
use crate::version::versions_38_plus;
use async_trait::async_trait;

use super::authdomain;
use super::authdomain_ad::{directory_fill, directory_payload, directory_schema, fetch};

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDomainLdapResource;

#[async_trait]
impl Resource for AuthDomainLdapResource {
    fn name(&self) -> &'static str {
        "authdomain_ldap"
    }

    fn schema(&self) -> Schema {
        directory_schema()
    }

    fn versions(&self) -> &'static [&'static str] {
        versions_38_plus()
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = directory_payload(d, "LDAP");
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
        authdomain::update(client, d, &directory_payload(d, "LDAP")).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        authdomain::delete(client, d).await
    }

    /// Resolves `<domain_name>` to the domain ID before the read-back
    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        authdomain::import(client, d).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_type() {
        let d = ResourceData::from_config(
            AuthDomainLdapResource.schema(),
            json!({"domain_name": "ldap", "auth_domain_name": "ldap.example.com",
                   "default_email_domain": "example.com", "default_language": "fr",
                   "external_auths": ["ldap1"], "is_default": true})
            .as_object()
            .cloned()
            .unwrap(),
        );
        let payload = serde_json::to_value(directory_payload(&d, "LDAP")).unwrap();
        assert_eq!(payload["type"], "LDAP");
        assert_eq!(payload["is_default"], true);
    }

    #[test]
    fn test_language_is_checked() {
        let diags = AuthDomainLdapResource.schema().validate(
            json!({"domain_name": "ldap", "auth_domain_name": "a", "default_email_domain": "b",
                   "default_language": "it", "external_auths": []})
            .as_object()
            .unwrap(),
        );
        assert!(diags.has_errors());
    }
}
