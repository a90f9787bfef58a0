//! `wallix-bastion_usergroup`

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};
use super::{restrictions_schema, JsonRestriction};

const USER_GROUPS: NamedCollection = NamedCollection::new("/usergroups/", "group_name").scanned().forced();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonUserGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    description: String,
    group_name: String,
    profile: String,
    timeframes: Vec<String>,
    restrictions: Vec<JsonRestriction>,
}

has_id!(JsonUserGroup);

#[derive(Debug, Clone, Copy, Default)]
pub struct UserGroupResource;

impl UserGroupResource {
    /// Membership is also managed from the user side, so `users` is only
    /// sent when the configuration changed it.
    fn payload(d: &ResourceData) -> Result<JsonUserGroup> {
        Ok(JsonUserGroup {
            users: d.has_change("users").then(|| d.get_string_list("users")),
            description: d.get_string("description"),
            group_name: d.get_string("group_name"),
            profile: d.get_string("profile"),
            timeframes: d.get_string_list("timeframes"),
            restrictions: d.get_blocks("restrictions")?,
            ..JsonUserGroup::default()
        })
    }
}

#[async_trait]
impl Resource for UserGroupResource {
    fn name(&self) -> &'static str {
        "usergroup"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("group_name", Attribute::string().required())
            .with_attribute("timeframes", Attribute::string_set().required())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("profile", Attribute::string().optional())
            .with_attribute("restrictions", Attribute::block_set(restrictions_schema()).optional())
            .with_attribute("users", Attribute::string_set().optional().computed())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d)?;
        USER_GROUPS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = USER_GROUPS.fetch::<JsonUserGroup>(client, d.id()).await? else {
            d.set_id("");
            return Ok(());
        };
        d.set("group_name", json.group_name)?;
        d.set("timeframes", json.timeframes)?;
        d.set("description", json.description)?;
        d.set("profile", json.profile)?;
        d.set("restrictions", json.restrictions)?;
        d.set("users", json.users)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        USER_GROUPS.update(client, d, &Self::payload(d)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        USER_GROUPS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        USER_GROUPS.import(client, d, "<group_name>").await
    }
}
