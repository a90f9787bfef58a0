//! `wallix-bastion_profile`: administration rights granted to user groups.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collection::{has_id, NamedCollection};
use super::non_empty;

const PROFILES: NamedCollection = NamedCollection::new("/profiles/", "profile_name").forced();

const VIEW: [&str; 1] = ["view"];
const VIEW_MODIFY: [&str; 2] = ["view", "modify"];
const MODIFY: [&str; 1] = ["modify"];
const EXECUTE: [&str; 1] = ["execute"];

/// GUI rights and the rights a profile may hand over to others.
///
/// Only `gui_features` knows `wab_audit`.
const GUI_RIGHTS: [(&str, &[&str]); 12] = [
    ("system_audit", &VIEW),
    ("users", &VIEW_MODIFY),
    ("user_groups", &VIEW_MODIFY),
    ("devices", &VIEW_MODIFY),
    ("target_groups", &VIEW_MODIFY),
    ("authorizations", &VIEW_MODIFY),
    ("profiles", &MODIFY),
    ("wab_settings", &VIEW_MODIFY),
    ("system_settings", &MODIFY),
    ("backup", &EXECUTE),
    ("approval", &VIEW_MODIFY),
    ("credential_recovery", &EXECUTE),
];

/// Unset rights are sent as `null`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct JsonGuiRights {
    #[serde(skip_serializing_if = "Option::is_none")]
    wab_audit: Option<String>,
    system_audit: Option<String>,
    users: Option<String>,
    user_groups: Option<String>,
    devices: Option<String>,
    target_groups: Option<String>,
    authorizations: Option<String>,
    profiles: Option<String>,
    wab_settings: Option<String>,
    system_settings: Option<String>,
    backup: Option<String>,
    approval: Option<String>,
    credential_recovery: Option<String>,
}

impl JsonGuiRights {
    /// An empty string in the configuration means "no right"
    fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            wab_audit: keep(self.wab_audit),
            system_audit: keep(self.system_audit),
            users: keep(self.users),
            user_groups: keep(self.user_groups),
            devices: keep(self.devices),
            target_groups: keep(self.target_groups),
            authorizations: keep(self.authorizations),
            profiles: keep(self.profiles),
            wab_settings: keep(self.wab_settings),
            system_settings: keep(self.system_settings),
            backup: keep(self.backup),
            approval: keep(self.approval),
            credential_recovery: keep(self.credential_recovery),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonTargetGroupsLimitation {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_target_group: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonUserGroupsLimitation {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonProfile {
    target_access: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    profile_name: String,
    description: String,
    ip_limitation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboards: Option<Vec<String>>,
    gui_features: JsonGuiRights,
    gui_transmission: JsonGuiRights,
    target_groups_limitation: JsonTargetGroupsLimitation,
    user_groups_limitation: JsonUserGroupsLimitation,
}

has_id!(JsonProfile);

/// Configuration side of `target_groups_limitation`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct TargetGroupsLimitationBlock {
    default_target_group: String,
    target_groups: Vec<String>,
}

/// Configuration side of `user_groups_limitation`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserGroupsLimitationBlock {
    user_groups: Vec<String>,
}

fn gui_schema(with_wab_audit: bool) -> Schema {
    let schema = GUI_RIGHTS.iter().fold(Schema::new(), |schema, &(name, values)| {
        schema.with_attribute(name, Attribute::string().optional().one_of(values))
    });
    if with_wab_audit {
        schema.with_attribute("wab_audit", Attribute::string().optional().one_of(&VIEW))
    } else {
        schema
    }
}

fn first_block<T: serde::de::DeserializeOwned>(d: &ResourceData, key: &str) -> Result<Option<T>> {
    Ok(d.get_blocks::<T>(key)?.into_iter().next())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileResource;

impl ProfileResource {
    fn payload(d: &ResourceData, new_resource: bool) -> Result<JsonProfile> {
        let mut json = JsonProfile {
            target_access: d.get_bool("target_access"),
            description: d.get_string("description"),
            ip_limitation: d.get_string("ip_limitation"),
            dashboards: non_empty(d.get_string_list("dashboards")),
            ..JsonProfile::default()
        };
        if new_resource {
            json.profile_name = d.get_string("profile_name");
        }
        if let Some(features) = first_block::<JsonGuiRights>(d, "gui_features")? {
            json.gui_features = features.normalized();
        }
        if let Some(transmission) = first_block::<JsonGuiRights>(d, "gui_transmission")? {
            json.gui_transmission = JsonGuiRights {
                wab_audit: None,
                ..transmission.normalized()
            };
        }
        if let Some(limitation) = first_block::<TargetGroupsLimitationBlock>(d, "target_groups_limitation")? {
            json.target_groups_limitation = JsonTargetGroupsLimitation {
                enabled: true,
                default_target_group: Some(if limitation.default_target_group.is_empty() {
                    Value::Null
                } else {
                    Value::String(limitation.default_target_group)
                }),
                target_groups: Some(limitation.target_groups),
            };
        }
        if let Some(limitation) = first_block::<UserGroupsLimitationBlock>(d, "user_groups_limitation")? {
            json.user_groups_limitation = JsonUserGroupsLimitation {
                enabled: true,
                user_groups: Some(limitation.user_groups),
            };
        }
        Ok(json)
    }

    fn fill(d: &mut ResourceData, json: JsonProfile) -> Result<()> {
        d.set("gui_features", [json.gui_features])?;
        d.set(
            "gui_transmission",
            [JsonGuiRights {
                wab_audit: None,
                ..json.gui_transmission
            }],
        )?;
        d.set("description", json.description)?;
        d.set("dashboards", json.dashboards)?;
        d.set("ip_limitation", json.ip_limitation)?;
        d.set("target_access", json.target_access)?;

        let target_groups = &json.target_groups_limitation;
        if target_groups.enabled {
            let block = TargetGroupsLimitationBlock {
                default_target_group: target_groups
                    .default_target_group
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                target_groups: target_groups.target_groups.clone().unwrap_or_default(),
            };
            d.set("target_groups_limitation", [block])?;
        } else {
            d.set("target_groups_limitation", Vec::<TargetGroupsLimitationBlock>::new())?;
        }

        let user_groups = json.user_groups_limitation;
        if user_groups.enabled {
            let block = UserGroupsLimitationBlock {
                user_groups: user_groups.user_groups.unwrap_or_default(),
            };
            d.set("user_groups_limitation", [block])
        } else {
            d.set("user_groups_limitation", Vec::<UserGroupsLimitationBlock>::new())
        }
    }
}

#[async_trait]
impl Resource for ProfileResource {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("profile_name", Attribute::string().required().force_new())
            .with_attribute("gui_features", Attribute::block_list(gui_schema(true)).required().max_items(1))
            .with_attribute(
                "gui_transmission",
                Attribute::block_list(gui_schema(false)).required().max_items(1),
            )
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("dashboards", Attribute::string_set().optional())
            .with_attribute("ip_limitation", Attribute::string().optional())
            .with_attribute("target_access", Attribute::bool().optional())
            .with_attribute(
                "target_groups_limitation",
                Attribute::block_list(
                    Schema::new()
                        .with_attribute("default_target_group", Attribute::string().required())
                        .with_attribute("target_groups", Attribute::string_set().required()),
                )
                .optional()
                .max_items(1),
            )
            .with_attribute(
                "user_groups_limitation",
                Attribute::block_list(Schema::new().with_attribute("user_groups", Attribute::string_set().required()))
                    .optional()
                    .max_items(1),
            )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d, true)?;
        PROFILES.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match PROFILES.fetch::<JsonProfile>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        PROFILES.update(client, d, &Self::payload(d, false)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        PROFILES.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        PROFILES.import(client, d, "<profile_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> ResourceData {
        ResourceData::from_config(
            ProfileResource.schema(),
            json!({
                "profile_name": "auditor",
                "gui_features": [{"wab_audit": "view", "users": "view", "backup": ""}],
                "gui_transmission": [{"users": "view"}],
                "target_groups_limitation": [{"default_target_group": "linux", "target_groups": ["linux", "windows"]}]
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
    }

    #[test]
    fn test_payload_rights_and_limitations() {
        let payload = serde_json::to_value(ProfileResource::payload(&data(), true).unwrap()).unwrap();
        assert_eq!(payload["profile_name"], "auditor");
        assert_eq!(payload["gui_features"]["wab_audit"], "view");
        assert_eq!(payload["gui_features"]["backup"], Value::Null);
        assert!(payload["gui_transmission"].get("wab_audit").is_none());
        assert_eq!(payload["target_groups_limitation"]["enabled"], true);
        assert_eq!(payload["target_groups_limitation"]["default_target_group"], "linux");
        assert_eq!(payload["user_groups_limitation"], json!({"enabled": false}));
        assert!(payload.get("dashboards").is_none());
    }

    #[test]
    fn test_profile_name_not_sent_on_update() {
        let payload = serde_json::to_value(ProfileResource::payload(&data(), false).unwrap()).unwrap();
        assert!(payload.get("profile_name").is_none());
    }

    #[test]
    fn test_rights_values() {
        let schema = ProfileResource.schema();
        let config = json!({"profile_name": "p", "gui_features": [{"profiles": "view"}], "gui_transmission": [{}]});
        assert!(schema.validate(config.as_object().unwrap()).has_errors());
        let config = json!({"profile_name": "p", "gui_features": [{}], "gui_transmission": [{"wab_audit": "view"}]});
        assert!(schema.validate(config.as_object().unwrap()).has_errors());
    }
}
