//! `wallix-bastion_user`: local users, addressed by name.

use crate::client::BastionClient;
use crate::constants::LANGUAGES;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::already_exists;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    force_change_pwd: Option<bool>,
    is_disabled: bool,
    user_name: String,
    certificate_dn: String,
    display_name: String,
    email: String,
    expiration_date: String,
    ip_source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    preferred_language: String,
    profile: String,
    ssh_public_key: String,
    user_auths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserResource;

impl UserResource {
    fn payload(d: &ResourceData, new_resource: bool) -> JsonUser {
        let mut json = JsonUser {
            user_name: d.get_string("user_name"),
            display_name: d.get_string("display_name"),
            email: d.get_string("email"),
            ip_source: d.get_string("ip_source"),
            profile: d.get_string("profile"),
            ssh_public_key: d.get_string("ssh_public_key"),
            certificate_dn: d.get_string("certificate_dn"),
            expiration_date: d.get_string("expiration_date"),
            is_disabled: d.get_bool("is_disabled"),
            user_auths: d.get_string_list("user_auths"),
            ..JsonUser::default()
        };

        if new_resource {
            json.preferred_language = d.get_string("preferred_language");
            json.password = d.get_string("password");
            if d.get_bool("force_change_pwd") {
                json.force_change_pwd = Some(true);
            }
        } else if d.has_change("password") && !d.get_bool("force_change_pwd") {
            json.password = d.get_string("password");
        }

        // groups only on change
        if d.has_change("groups") {
            json.groups = Some(d.get_string_list("groups"));
        }

        json
    }

    fn fill(d: &mut ResourceData, json: JsonUser) -> Result<()> {
        d.set("user_name", json.user_name)?;
        d.set("email", json.email)?;
        d.set("profile", json.profile)?;
        d.set("user_auths", json.user_auths)?;
        d.set("certificate_dn", json.certificate_dn)?;
        d.set("display_name", json.display_name)?;
        d.set("expiration_date", json.expiration_date)?;
        d.set("groups", json.groups.unwrap_or_default())?;
        d.set("ip_source", json.ip_source)?;
        d.set("is_disabled", json.is_disabled)?;
        d.set("preferred_language", json.preferred_language)?;
        d.set("ssh_public_key", json.ssh_public_key)
    }
}

#[async_trait]
impl Resource for UserResource {
    fn name(&self) -> &'static str {
        "user"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("user_name", Attribute::string().required().force_new())
            .with_attribute("email", Attribute::string().required())
            .with_attribute("profile", Attribute::string().required())
            .with_attribute("user_auths", Attribute::string_set().required())
            .with_attribute("certificate_dn", Attribute::string().optional())
            .with_attribute("display_name", Attribute::string().optional())
            .with_attribute("expiration_date", Attribute::string().optional())
            .with_attribute("force_change_pwd", Attribute::bool().optional())
            .with_attribute("groups", Attribute::string_set().optional().computed())
            .with_attribute("ip_source", Attribute::string().optional())
            .with_attribute("is_disabled", Attribute::bool().optional())
            .with_attribute("password", Attribute::string().optional().sensitive())
            .with_attribute(
                "preferred_language",
                Attribute::string().optional().computed().one_of(&LANGUAGES),
            )
            .with_attribute("ssh_public_key", Attribute::string().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let user_name = d.get_string("user_name");
        if client
            .get_json::<serde_json::Value>(&format!("/users/{user_name}"))
            .await?
            .is_some()
        {
            return Err(already_exists("user_name", user_name));
        }
        client.post("/users/", &Self::payload(d, true)).await?;
        d.set_id(user_name);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match client.get_json::<JsonUser>(&format!("/users/{}", d.id())).await? {
            Some(json) if !json.user_name.is_empty() => Self::fill(d, json),
            _ => {
                debug!(user_name = d.id(), "user not found");
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client
            .put(
                &format!("/users/{}?force=true", d.get_string("user_name")),
                &Self::payload(d, false),
            )
            .await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client.delete(&format!("/users/{}", d.id())).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let user_name = d.id().to_string();
        if client
            .get_json::<serde_json::Value>(&format!("/users/{user_name}"))
            .await?
            .is_none()
        {
            return Err(BastionError::ImportNotFound {
                field: "user_name",
                id: user_name,
                expected: "<user_name>",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(config: serde_json::Value) -> ResourceData {
        ResourceData::from_config(UserResource.schema(), config.as_object().cloned().unwrap())
    }

    #[test]
    fn test_create_payload_carries_password_and_language() {
        let d = data(json!({
            "user_name": "alice",
            "email": "alice@example.com",
            "profile": "user",
            "user_auths": ["local_password"],
            "password": "s3cret",
            "preferred_language": "fr",
            "force_change_pwd": true,
            "groups": ["ops"]
        }));
        let payload = serde_json::to_value(UserResource::payload(&d, true)).unwrap();
        assert_eq!(payload["password"], "s3cret");
        assert_eq!(payload["preferred_language"], "fr");
        assert_eq!(payload["force_change_pwd"], true);
        assert_eq!(payload["groups"], json!(["ops"]));
    }

    #[test]
    fn test_update_payload_skips_unchanged_password_and_groups() {
        let prior = json!({
            "id": "alice", "user_name": "alice", "email": "a@example.com", "profile": "user",
            "user_auths": ["local_password"], "password": "s3cret", "groups": ["ops"]
        });
        let config = json!({
            "user_name": "alice", "email": "new@example.com", "profile": "user",
            "user_auths": ["local_password"], "password": "s3cret", "groups": ["ops"]
        });
        let d = ResourceData::for_update(
            UserResource.schema(),
            prior.as_object().cloned().unwrap(),
            config.as_object().cloned().unwrap(),
        );
        let payload = serde_json::to_value(UserResource::payload(&d, false)).unwrap();
        assert!(payload.get("password").is_none());
        assert!(payload.get("groups").is_none());
        assert!(payload.get("preferred_language").is_none());
        assert_eq!(payload["email"], "new@example.com");
    }

    #[test]
    fn test_schema_rejects_unknown_language() {
        let diags = UserResource.schema().validate(
            json!({"user_name": "a", "email": "e", "profile": "p", "user_auths": [], "preferred_language": "it"})
                .as_object()
                .unwrap(),
        );
        assert!(diags.has_errors());
    }
}
