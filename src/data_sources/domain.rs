//! `wallix-bastion_domain`: look a global domain up by name.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::DataSource;
use crate::resources::domain;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainDataSource;

#[async_trait]
impl DataSource for DomainDataSource {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_name", Attribute::string().required())
            .with_attribute("domain_real_name", Attribute::string().computed())
            .with_attribute("admin_account", Attribute::string().computed())
            .with_attribute("ca_public_key", Attribute::string().computed())
            .with_attribute("description", Attribute::string().computed())
            .with_attribute("enable_password_change", Attribute::bool().computed())
            .with_attribute("password_change_policy", Attribute::string().computed())
            .with_attribute("password_change_plugin", Attribute::string().computed())
            .with_attribute("vault_plugin", Attribute::string().computed())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_name = d.get_string("domain_name");
        let missing = || BastionError::DoesNotExist {
            field: "domain_name",
            name: domain_name.clone(),
        };
        let id = domain::search(client, &domain_name).await?.ok_or_else(missing)?;
        let json = domain::fetch(client, &id).await?.ok_or_else(missing)?;
        d.set("domain_real_name", json.domain_real_name)?;
        d.set("ca_public_key", json.ca_public_key)?;
        d.set("description", json.description)?;
        json.password_change.fill(d)?;
        d.set("vault_plugin", json.vault_plugin)?;
        d.set_id(id);
        Ok(())
    }
}
