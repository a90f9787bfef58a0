//! `wallix-bastion_authdomain_ad`: look an Active Directory auth domain up by name.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::DataSource;
use crate::resources::{authdomain, authdomain_ad};
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::versions_38_plus;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDomainAdDataSource;

#[async_trait]
impl DataSource for AuthDomainAdDataSource {
    fn name(&self) -> &'static str {
        "authdomain_ad"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_name", Attribute::string().required())
            .with_attribute("auth_domain_name", Attribute::string().computed())
            .with_attribute("default_email_domain", Attribute::string().computed())
            .with_attribute("default_language", Attribute::string().computed())
            .with_attribute("external_auths", Attribute::string_list().computed())
            .with_attribute("language_attribute", Attribute::string().computed())
            .with_attribute("secondary_auth", Attribute::string_list().computed())
    }

    /// Auth domains only exist from API v3.8 on
    fn versions(&self) -> &'static [&'static str] {
        versions_38_plus()
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_name = d.get_string("domain_name");
        let missing = || BastionError::DoesNotExist {
            field: "domain_name",
            name: domain_name.clone(),
        };
        let id = authdomain::search(client, &domain_name).await?.ok_or_else(missing)?;
        let json = authdomain_ad::fetch(client, &id).await?.ok_or_else(missing)?;
        d.set("domain_name", json.domain_name)?;
        d.set("auth_domain_name", json.auth_domain_name)?;
        d.set("default_email_domain", json.default_email_domain)?;
        d.set("default_language", json.default_language)?;
        d.set("external_auths", json.external_auths)?;
        d.set("language_attribute", json.language_attribute)?;
        d.set("secondary_auth", json.secondary_auth)?;
        d.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{VERSION_WALLIX_API_312, VERSION_WALLIX_API_38};

    #[test]
    fn test_available_from_38() {
        let versions = AuthDomainAdDataSource.versions();
        assert_eq!(versions, [VERSION_WALLIX_API_38, VERSION_WALLIX_API_312]);
        assert!(!versions.contains(&"v3.6"));
    }

    #[test]
    fn test_lists_are_computed() {
        let schema = AuthDomainAdDataSource.schema();
        for key in ["external_auths", "secondary_auth"] {
            let attr = schema.get(key).unwrap();
            assert!(attr.computed && !attr.is_configurable(), "{key}");
        }
        assert!(schema.get("domain_name").unwrap().required);
    }
}
