//! `wallix-bastion_authdomain_mapping`: maps an external directory group
//! onto a Bastion user group for one authentication domain.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::versions_38_plus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{already_exists, authdomain, not_found_after_post, split_import_id};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonAuthDomainMapping {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    domain: String,
    user_group: String,
    external_group: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDomainMappingResource;

fn collection(domain_id: &str) -> String {
    format!("{}/mappings/", authdomain::AUTHDOMAINS.object_uri(domain_id))
}

async fn search(client: &BastionClient, domain_id: &str, user_group: &str) -> Result<Option<String>> {
    client
        .search_by_query(&collection(domain_id), "user_group", user_group)
        .await
}

impl AuthDomainMappingResource {
    fn payload(d: &ResourceData) -> JsonAuthDomainMapping {
        JsonAuthDomainMapping {
            user_group: d.get_string("user_group"),
            external_group: d.get_string("external_group"),
            ..JsonAuthDomainMapping::default()
        }
    }

    fn object_uri(d: &ResourceData) -> String {
        format!("{}{}", collection(&d.get_string("domain_id")), d.id())
    }
}

#[async_trait]
impl Resource for AuthDomainMappingResource {
    fn name(&self) -> &'static str {
        "authdomain_mapping"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_id", Attribute::string().required().force_new())
            .with_attribute("user_group", Attribute::string().required())
            .with_attribute("external_group", Attribute::string().required())
            .with_attribute("domain", Attribute::string().computed())
    }

    fn versions(&self) -> &'static [&'static str] {
        versions_38_plus()
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_id = d.get_string("domain_id");
        let user_group = d.get_string("user_group");
        authdomain::ensure_exists(client, &domain_id).await?;
        let described = format!("{user_group} on domain_id {domain_id}");
        if search(client, &domain_id, &user_group).await?.is_some() {
            return Err(already_exists("user_group", described));
        }
        client
            .post(&collection(&domain_id), &Self::payload(d))
            .await?;
        let id = search(client, &domain_id, &user_group)
            .await?
            .ok_or_else(|| not_found_after_post("user_group", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match client
            .get_json::<JsonAuthDomainMapping>(&Self::object_uri(d))
            .await?
        {
            Some(json) if !json.id.is_empty() => {
                d.set("user_group", json.user_group)?;
                d.set("external_group", json.external_group)?;
                d.set("domain", json.domain)
            }
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client.put(&Self::object_uri(d), &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client.delete(&Self::object_uri(d)).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<domain_id>/<user_group>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 2, EXPECTED)?;
        let id = search(client, parts[0], parts[1])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "user_group",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("domain_id", parts[0])?;
        d.set_id(id);
        Ok(())
    }
}
