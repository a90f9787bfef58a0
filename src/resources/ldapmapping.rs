//! `wallix-bastion_ldapmapping`: legacy LDAP group to user group mapping.
//!
//! Mappings have no ID on the appliance; state uses
//! `<domain>/<user_group>/<ldap_group>` and every attribute forces
//! replacement.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::{at_least, versions_legacy_ldap, ApiVersion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::split_import_id;

const LDAP_MAPPINGS: &str = "/ldapmappings/";
const ID_FORMAT: &str = "<domain>/<user_group>/<ldap_group>";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct JsonLdapMapping {
    domain: String,
    user_group: String,
    ldap_group: String,
}

impl JsonLdapMapping {
    fn from_data(d: &ResourceData) -> Self {
        Self {
            domain: d.get_string("domain"),
            user_group: d.get_string("user_group"),
            ldap_group: d.get_string("ldap_group"),
        }
    }

    fn from_id(id: &str) -> Result<Self> {
        let parts = split_import_id(id, 3, ID_FORMAT)?;
        Ok(Self {
            domain: parts[0].to_string(),
            user_group: parts[1].to_string(),
            ldap_group: parts[2].to_string(),
        })
    }

    fn id(&self) -> String {
        format!("{}/{}/{}", self.domain, self.user_group, self.ldap_group)
    }

    /// The filter joins its terms with `&&`, percent-encoded in the query
    fn query_uri(&self) -> String {
        format!(
            "{LDAP_MAPPINGS}?q=domain={}%26%26user_group={}",
            self.domain, self.user_group
        )
    }

    async fn exists(&self, client: &BastionClient) -> Result<bool> {
        let results: Vec<JsonLdapMapping> = client.get_required(&self.query_uri()).await?;
        Ok(matches!(results.as_slice(), [only] if only.ldap_group == self.ldap_group))
    }

    fn fill(&self, d: &mut ResourceData) -> Result<()> {
        d.set("domain", &self.domain)?;
        d.set("user_group", &self.user_group)?;
        d.set("ldap_group", &self.ldap_group)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LdapMappingResource;

#[async_trait]
impl Resource for LdapMappingResource {
    fn name(&self) -> &'static str {
        "ldapmapping"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain", Attribute::string().required().force_new())
            .with_attribute("user_group", Attribute::string().required().force_new())
            .with_attribute("ldap_group", Attribute::string().required().force_new())
    }

    fn versions(&self) -> &'static [&'static str] {
        versions_legacy_ldap()
    }

    fn version_hint(&self, version: &str) -> Option<&'static str> {
        at_least(version, ApiVersion::V3_8).then_some("use wallix-bastion_authdomain_mapping instead")
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let mapping = JsonLdapMapping::from_data(d);
        if mapping.exists(client).await? {
            return Err(BastionError::validation(format!(
                "ldapmapping {} already exists",
                mapping.id()
            )));
        }
        client.post(LDAP_MAPPINGS, &mapping).await?;
        d.set_id(mapping.id());
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let mapping = JsonLdapMapping::from_data(d);
        if mapping.exists(client).await? {
            mapping.fill(d)
        } else {
            d.set_id("");
            Ok(())
        }
    }

    async fn update(&self, _client: &BastionClient, _d: &mut ResourceData) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        let mapping = JsonLdapMapping::from_id(d.id())?;
        client.delete(&format!("{LDAP_MAPPINGS}{}", mapping.id())).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let mapping = JsonLdapMapping::from_id(d.id())?;
        if !mapping.exists(client).await? {
            return Err(BastionError::ImportNotFound {
                field: "ldapmapping",
                id: d.id().to_string(),
                expected: ID_FORMAT,
            });
        }
        mapping.fill(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip_and_query() {
        let mapping = JsonLdapMapping::from_id("corp/admins/cn=admins").unwrap();
        assert_eq!(mapping.id(), "corp/admins/cn=admins");
        assert_eq!(mapping.query_uri(), "/ldapmappings/?q=domain=corp%26%26user_group=admins");
        assert!(JsonLdapMapping::from_id("corp/admins").is_err());
    }

    #[test]
    fn test_hint_only_for_newer_versions() {
        assert_eq!(
            LdapMappingResource.version_hint("v3.8"),
            Some("use wallix-bastion_authdomain_mapping instead")
        );
        assert_eq!(LdapMappingResource.version_hint("v3.6"), None);
    }
}
