//! `wallix-bastion_targetgroup`: the targets a group of users may reach.
//!
//! A target is either an account on a device/service or on an application;
//! each block kind has its own rules about which of `device`, `service` and
//! `application` must be set, checked before anything is sent.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};
use super::{restrictions_schema, JsonRestriction};

const TARGET_GROUPS: NamedCollection = NamedCollection::new("/targetgroups/", "group_name").forced();

const DOMAIN_TYPE_LOCAL: &str = "local";
const DOMAIN_TYPE_GLOBAL: &str = "global";
const DOMAIN_TYPES: [&str; 2] = [DOMAIN_TYPE_LOCAL, DOMAIN_TYPE_GLOBAL];

/// Account on a device or application, optionally through a service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct JsonTargetAccount {
    account: String,
    domain: String,
    domain_type: String,
    device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    application: String,
}

/// Account mapping or interactive login target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct JsonTargetService {
    device: String,
    service: String,
    application: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonPasswordRetrieval {
    accounts: Vec<JsonTargetAccount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonSession {
    accounts: Vec<JsonTargetAccount>,
    account_mappings: Vec<JsonTargetService>,
    interactive_logins: Vec<JsonTargetService>,
    scenario_accounts: Vec<JsonTargetAccount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonTargetGroup {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    description: String,
    group_name: String,
    password_retrieval: JsonPasswordRetrieval,
    restrictions: Vec<JsonRestriction>,
    session: JsonSession,
}

has_id!(JsonTargetGroup);

fn bad(block: &str, reason: impl std::fmt::Display) -> BastionError {
    BastionError::validation(format!("bad {block}: {reason}"))
}

/// Global accounts stand alone; local ones live on a device or an application
fn check_domain_account(block: &str, account: &JsonTargetAccount) -> Result<()> {
    let has_device = !account.device.is_empty();
    let has_application = !account.application.is_empty();
    match account.domain_type.as_str() {
        DOMAIN_TYPE_GLOBAL if has_device || has_application => Err(bad(
            block,
            "device and application need to be null with domain_type=global",
        )),
        DOMAIN_TYPE_LOCAL if !has_device && !has_application => Err(bad(
            block,
            "device or application need to be set with domain_type=local",
        )),
        DOMAIN_TYPE_LOCAL | DOMAIN_TYPE_GLOBAL => Ok(()),
        _ if has_device && has_application => Err(bad(block, "device and application mutually exclusive")),
        _ => Ok(()),
    }
}

/// `device` and `service` go together and exclude `application`
fn check_service_target(block: &str, device: &str, service: &str, application: &str) -> Result<()> {
    if !device.is_empty() && !application.is_empty() {
        return Err(bad(block, "device and application mutually exclusive"));
    }
    if !service.is_empty() && !application.is_empty() {
        return Err(bad(block, "service and application mutually exclusive"));
    }
    if !device.is_empty() && service.is_empty() {
        return Err(bad(block, format!("missing service for device {device}")));
    }
    if !service.is_empty() && device.is_empty() {
        return Err(bad(block, format!("missing device for service {service}")));
    }
    Ok(())
}

fn check_session_account(account: &JsonTargetAccount) -> Result<()> {
    let service = account.service.as_deref().unwrap_or_default();
    if (account.device.is_empty() || service.is_empty()) && account.application.is_empty() {
        return Err(bad("session_accounts", "device/service or application need to be set"));
    }
    check_service_target("session_accounts", &account.device, service, &account.application)
}

fn account_schema(with_service: bool) -> Schema {
    let schema = Schema::new()
        .with_attribute("account", Attribute::string().required())
        .with_attribute("domain", Attribute::string().required())
        .with_attribute("domain_type", Attribute::string().required().one_of(&DOMAIN_TYPES))
        .with_attribute("device", Attribute::string().default(""))
        .with_attribute("application", Attribute::string().default(""));
    if with_service {
        schema.with_attribute("service", Attribute::string().default(""))
    } else {
        schema
    }
}

fn service_schema() -> Schema {
    Schema::new()
        .with_attribute("device", Attribute::string().default(""))
        .with_attribute("service", Attribute::string().default(""))
        .with_attribute("application", Attribute::string().default(""))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TargetGroupResource;

impl TargetGroupResource {
    fn payload(d: &ResourceData) -> Result<JsonTargetGroup> {
        let mut password_accounts: Vec<JsonTargetAccount> = d.get_blocks("password_retrieval_accounts")?;
        for account in &mut password_accounts {
            account.service = None;
            check_domain_account("password_retrieval_accounts", account)?;
        }

        let mut session_accounts: Vec<JsonTargetAccount> = d.get_blocks("session_accounts")?;
        for account in &mut session_accounts {
            account.service.get_or_insert_with(String::new);
            check_session_account(account)?;
        }

        let account_mappings: Vec<JsonTargetService> = d.get_blocks("session_account_mappings")?;
        for target in &account_mappings {
            check_service_target("session_account_mappings", &target.device, &target.service, &target.application)?;
        }

        let interactive_logins: Vec<JsonTargetService> = d.get_blocks("session_interactive_logins")?;
        for target in &interactive_logins {
            check_service_target("session_interactive_logins", &target.device, &target.service, &target.application)?;
        }

        let mut scenario_accounts: Vec<JsonTargetAccount> = d.get_blocks("session_scenario_accounts")?;
        for account in &mut scenario_accounts {
            account.service = None;
            check_domain_account("session_scenario_accounts", account)?;
        }

        Ok(JsonTargetGroup {
            description: d.get_string("description"),
            group_name: d.get_string("group_name"),
            password_retrieval: JsonPasswordRetrieval {
                accounts: password_accounts,
            },
            restrictions: d.get_blocks("restrictions")?,
            session: JsonSession {
                accounts: session_accounts,
                account_mappings,
                interactive_logins,
                scenario_accounts,
            },
            ..JsonTargetGroup::default()
        })
    }

    fn fill(d: &mut ResourceData, json: JsonTargetGroup) -> Result<()> {
        let without_service = |accounts: Vec<JsonTargetAccount>| -> Vec<JsonTargetAccount> {
            accounts
                .into_iter()
                .map(|a| JsonTargetAccount { service: None, ..a })
                .collect()
        };
        let with_service = |accounts: Vec<JsonTargetAccount>| -> Vec<JsonTargetAccount> {
            accounts
                .into_iter()
                .map(|a| JsonTargetAccount {
                    service: Some(a.service.unwrap_or_default()),
                    ..a
                })
                .collect()
        };
        d.set("group_name", json.group_name)?;
        d.set("description", json.description)?;
        d.set(
            "password_retrieval_accounts",
            without_service(json.password_retrieval.accounts),
        )?;
        d.set("restrictions", json.restrictions)?;
        d.set("session_accounts", with_service(json.session.accounts))?;
        d.set("session_account_mappings", json.session.account_mappings)?;
        d.set("session_interactive_logins", json.session.interactive_logins)?;
        d.set("session_scenario_accounts", without_service(json.session.scenario_accounts))
    }
}

#[async_trait]
impl Resource for TargetGroupResource {
    fn name(&self) -> &'static str {
        "targetgroup"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("group_name", Attribute::string().required())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "password_retrieval_accounts",
                Attribute::block_set(account_schema(false)).optional(),
            )
            .with_attribute("restrictions", Attribute::block_set(restrictions_schema()).optional())
            .with_attribute("session_accounts", Attribute::block_set(account_schema(true)).optional())
            .with_attribute("session_account_mappings", Attribute::block_set(service_schema()).optional())
            .with_attribute("session_interactive_logins", Attribute::block_set(service_schema()).optional())
            .with_attribute(
                "session_scenario_accounts",
                Attribute::block_set(account_schema(false)).optional(),
            )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d)?;
        TARGET_GROUPS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match TARGET_GROUPS.fetch::<JsonTargetGroup>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        TARGET_GROUPS.update(client, d, &Self::payload(d)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        TARGET_GROUPS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        TARGET_GROUPS.import(client, d, "<group_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(extra: serde_json::Value) -> ResourceData {
        let mut config = json!({"group_name": "linux"});
        for (k, v) in extra.as_object().unwrap() {
            config[k] = v.clone();
        }
        ResourceData::from_config(TargetGroupResource.schema(), config.as_object().cloned().unwrap())
    }

    fn error(extra: serde_json::Value) -> String {
        TargetGroupResource::payload(&data(extra)).unwrap_err().to_string()
    }

    #[test]
    fn test_global_account_rejects_device() {
        let err = error(json!({"password_retrieval_accounts": [
            {"account": "root", "domain": "corp", "domain_type": "global", "device": "srv1"}]}));
        assert!(err.contains("device and application need to be null with domain_type=global"));
    }

    #[test]
    fn test_local_account_needs_target() {
        let err = error(json!({"session_scenario_accounts": [
            {"account": "root", "domain": "local", "domain_type": "local"}]}));
        assert!(err.contains("bad session_scenario_accounts"));
    }

    #[test]
    fn test_session_account_rules() {
        let err = error(json!({"session_accounts": [
            {"account": "root", "domain": "local", "domain_type": "local", "device": "srv1"}]}));
        assert!(err.contains("device/service or application need to be set"));

        let err = error(json!({"session_account_mappings": [{"device": "srv1"}]}));
        assert!(err.contains("missing service for device srv1"));

        let err = error(json!({"session_interactive_logins": [{"service": "SSH", "application": "app"}]}));
        assert!(err.contains("service and application mutually exclusive"));
    }

    #[test]
    fn test_payload_shape() {
        let d = data(json!({
            "session_accounts": [{"account": "root", "domain": "local", "domain_type": "local",
                                  "device": "srv1", "service": "SSH"}],
            "password_retrieval_accounts": [{"account": "admin", "domain": "corp", "domain_type": "global"}]
        }));
        let payload = serde_json::to_value(TargetGroupResource::payload(&d).unwrap()).unwrap();
        assert_eq!(payload["session"]["accounts"][0]["service"], "SSH");
        assert!(payload["password_retrieval"]["accounts"][0].get("service").is_none());
        assert_eq!(payload["session"]["interactive_logins"], json!([]));
        assert_eq!(payload["restrictions"], json!([]));
    }
}
