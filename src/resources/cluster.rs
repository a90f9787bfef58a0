//! `wallix-bastion_cluster`: a group of targets sessions can be spread over.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const CLUSTERS: NamedCollection = NamedCollection::new("/clusters/", "cluster_name").scanned().forced();

const TARGET_KINDS: [&str; 3] = ["accounts", "account_mappings", "interactive_logins"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonCluster {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    cluster_name: String,
    description: String,
    accounts: Vec<String>,
    account_mappings: Vec<String>,
    interactive_logins: Vec<String>,
}

has_id!(JsonCluster);

#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterResource;

impl ClusterResource {
    fn payload(d: &ResourceData) -> JsonCluster {
        JsonCluster {
            cluster_name: d.get_string("cluster_name"),
            description: d.get_string("description"),
            accounts: d.get_string_list("accounts"),
            account_mappings: d.get_string_list("account_mappings"),
            interactive_logins: d.get_string_list("interactive_logins"),
            ..JsonCluster::default()
        }
    }
}

#[async_trait]
impl Resource for ClusterResource {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn schema(&self) -> Schema {
        let targets = || Attribute::string_set().optional().at_least_one_of(&TARGET_KINDS);
        Schema::new()
            .with_attribute("cluster_name", Attribute::string().required())
            .with_attribute("accounts", targets())
            .with_attribute("account_mappings", targets())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("interactive_logins", targets())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        CLUSTERS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = CLUSTERS.fetch::<JsonCluster>(client, d.id()).await? else {
            d.set_id("");
            return Ok(());
        };
        d.set("cluster_name", json.cluster_name)?;
        d.set("accounts", json.accounts)?;
        d.set("account_mappings", json.account_mappings)?;
        d.set("description", json.description)?;
        d.set("interactive_logins", json.interactive_logins)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        CLUSTERS.update(client, d, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        CLUSTERS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        CLUSTERS.import(client, d, "<cluster_name>").await
    }
}
