//! `wallix-bastion_authorization`: grants a user group access to a target
//! group, optionally behind an approval workflow.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};
use super::non_empty;

const AUTHORIZATIONS: NamedCollection = NamedCollection::new("/authorizations/", "authorization_name").forced();

/// Keys that only make sense together with `approval_required`
const APPROVAL_SETTINGS: [&str; 9] = [
    "approvers",
    "active_quorum",
    "inactive_quorum",
    "approval_timeout",
    "has_comment",
    "has_ticket",
    "mandatory_comment",
    "mandatory_ticket",
    "single_connection",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonAuthorization {
    approval_required: bool,
    authorize_password_retrieval: bool,
    authorize_sessions: bool,
    is_critical: bool,
    is_recorded: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    authorization_name: String,
    description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    target_group: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    user_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_comment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_ticket: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mandatory_comment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mandatory_ticket: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    single_connection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_quorum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inactive_quorum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approval_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approvers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subprotocols: Option<Vec<String>>,
}

has_id!(JsonAuthorization);

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationResource;

impl AuthorizationResource {
    /// Groups are fixed at creation; approval settings ride along only when
    /// approval is required.
    fn payload(d: &ResourceData, new_resource: bool) -> JsonAuthorization {
        let mut json = JsonAuthorization {
            authorization_name: d.get_string("authorization_name"),
            authorize_password_retrieval: d.get_bool("authorize_password_retrieval"),
            authorize_sessions: d.get_bool("authorize_sessions"),
            description: d.get_string("description"),
            approval_required: d.get_bool("approval_required"),
            is_critical: d.get_bool("is_critical"),
            is_recorded: d.get_bool("is_recorded"),
            subprotocols: non_empty(d.get_string_list("subprotocols")),
            ..JsonAuthorization::default()
        };
        if new_resource {
            json.user_group = d.get_string("user_group");
            json.target_group = d.get_string("target_group");
        }
        if json.approval_required {
            json.active_quorum = Some(d.get_int("active_quorum"));
            json.inactive_quorum = Some(d.get_int("inactive_quorum"));
            json.approval_timeout = Some(d.get_int("approval_timeout"));
            json.approvers = Some(d.get_string_list("approvers"));
            json.has_comment = Some(d.get_bool("has_comment"));
            json.has_ticket = Some(d.get_bool("has_ticket"));
            json.mandatory_comment = Some(d.get_bool("mandatory_comment"));
            json.mandatory_ticket = Some(d.get_bool("mandatory_ticket"));
            json.single_connection = Some(d.get_bool("single_connection"));
        }
        json
    }

    fn fill(d: &mut ResourceData, json: JsonAuthorization) -> Result<()> {
        d.set("authorization_name", json.authorization_name)?;
        d.set("user_group", json.user_group)?;
        d.set("target_group", json.target_group)?;
        d.set("description", json.description)?;
        d.set("authorize_password_retrieval", json.authorize_password_retrieval)?;
        d.set("authorize_sessions", json.authorize_sessions)?;
        d.set("subprotocols", json.subprotocols.unwrap_or_default())?;
        d.set("is_critical", json.is_critical)?;
        d.set("is_recorded", json.is_recorded)?;
        d.set("approval_required", json.approval_required)?;
        d.set("approvers", json.approvers.unwrap_or_default())?;
        d.set("active_quorum", json.active_quorum.unwrap_or(-1))?;
        d.set("inactive_quorum", json.inactive_quorum.unwrap_or(-1))?;
        d.set("approval_timeout", json.approval_timeout.unwrap_or_default())?;
        d.set("has_comment", json.has_comment.unwrap_or_default())?;
        d.set("has_ticket", json.has_ticket.unwrap_or_default())?;
        d.set("mandatory_comment", json.mandatory_comment.unwrap_or_default())?;
        d.set("mandatory_ticket", json.mandatory_ticket.unwrap_or_default())?;
        d.set("single_connection", json.single_connection.unwrap_or_default())
    }
}

#[async_trait]
impl Resource for AuthorizationResource {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn schema(&self) -> Schema {
        let access = ["authorize_sessions", "authorize_password_retrieval"];
        let mut schema = Schema::new()
            .with_attribute("authorization_name", Attribute::string().required())
            .with_attribute("user_group", Attribute::string().required().force_new())
            .with_attribute("target_group", Attribute::string().required().force_new())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "authorize_password_retrieval",
                Attribute::bool().optional().at_least_one_of(&access),
            )
            .with_attribute(
                "authorize_sessions",
                Attribute::bool()
                    .optional()
                    .required_with(&["subprotocols"])
                    .at_least_one_of(&access),
            )
            .with_attribute("subprotocols", Attribute::string_set().optional())
            .with_attribute("is_critical", Attribute::bool().optional())
            .with_attribute("is_recorded", Attribute::bool().optional())
            .with_attribute(
                "approval_required",
                Attribute::bool().optional().required_with(&["approvers"]),
            );
        for key in APPROVAL_SETTINGS {
            let attribute = match key {
                "approvers" => Attribute::string_list(),
                "active_quorum" | "inactive_quorum" => Attribute::int().default(-1),
                "approval_timeout" => Attribute::int(),
                _ => Attribute::bool(),
            };
            schema = schema.with_attribute(key, attribute.optional().required_with(&["approval_required"]));
        }
        schema
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d, true);
        AUTHORIZATIONS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match AUTHORIZATIONS.fetch::<JsonAuthorization>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        AUTHORIZATIONS.update(client, d, &Self::payload(d, false)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        AUTHORIZATIONS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        AUTHORIZATIONS.import(client, d, "<authorization_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(config: serde_json::Value) -> ResourceData {
        ResourceData::from_config(AuthorizationResource.schema(), config.as_object().cloned().unwrap())
    }

    #[test]
    fn test_approval_settings_only_with_approval() {
        let d = data(json!({"authorization_name": "a", "user_group": "u", "target_group": "t",
                            "authorize_sessions": true, "subprotocols": ["SSH_SHELL_SESSION"]}));
        let payload = serde_json::to_value(AuthorizationResource::payload(&d, true)).unwrap();
        assert!(payload.get("active_quorum").is_none());
        assert!(payload.get("approvers").is_none());
        assert_eq!(payload["user_group"], "u");

        let d = data(json!({"authorization_name": "a", "user_group": "u", "target_group": "t",
                            "authorize_password_retrieval": true, "approval_required": true,
                            "approvers": ["admins"]}));
        let payload = serde_json::to_value(AuthorizationResource::payload(&d, false)).unwrap();
        assert_eq!(payload["active_quorum"], -1);
        assert_eq!(payload["approvers"], json!(["admins"]));
        assert!(payload.get("user_group").is_none());
    }

    #[test]
    fn test_access_is_required() {
        let schema = AuthorizationResource.schema();
        let diags = schema.validate(
            json!({"authorization_name": "a", "user_group": "u", "target_group": "t"})
                .as_object()
                .unwrap(),
        );
        assert!(diags.has_errors());
        let diags = schema.validate(
            json!({"authorization_name": "a", "user_group": "u", "target_group": "t",
                   "authorize_password_retrieval": true, "has_ticket": true})
            .as_object()
            .unwrap(),
        );
        assert!(diags.has_errors());
    }
}
