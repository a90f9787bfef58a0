//! `wallix-bastion_application`: published applications.
//!
//! Two categories exist. A `standard` application runs programs on a
//! target; a `jumphost` application (API v3.12 and later) opens a URL in a
//! browser.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::{at_least, ApiVersion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::application_localdomain::JsonApplicationLocalDomain;
use super::collection::{has_id, NamedCollection};
use super::json_string;

const APPLICATIONS: NamedCollection = NamedCollection::new("/applications/", "application_name").forced();

const CATEGORIES: [&str; 2] = ["standard", "jumphost"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct JsonApplicationPath {
    target: String,
    program: String,
    working_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonApplication {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    application_name: String,
    connection_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser_version: Option<String>,
    description: String,
    parameters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    global_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paths: Option<Vec<JsonApplicationPath>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_domains: Option<Vec<JsonApplicationLocalDomain>>,
}

has_id!(JsonApplication);

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationResource;

pub(crate) async fn ensure_exists(client: &BastionClient, application_id: &str) -> Result<()> {
    super::ensure_parent(
        client,
        "application",
        &APPLICATIONS.object_uri(application_id),
        application_id,
    )
    .await
}

fn refuse(field: &str, category: &str) -> BastionError {
    BastionError::validation(format!("{field} cannot be configured when category = {category}"))
}

fn require(field: &str, category: &str) -> BastionError {
    BastionError::validation(format!("{field} must be specified when category = {category}"))
}

fn paths_schema() -> Schema {
    Schema::new()
        .with_attribute("target", Attribute::string().required())
        .with_attribute("program", Attribute::string().required())
        .with_attribute("working_dir", Attribute::string().default(""))
}

fn local_domains_schema() -> Schema {
    Schema::new()
        .with_attribute("id", Attribute::string().computed())
        .with_attribute("admin_account", Attribute::string().computed())
        .with_attribute("domain_name", Attribute::string().computed())
        .with_attribute("description", Attribute::string().computed())
        .with_attribute("enable_password_change", Attribute::bool().computed())
        .with_attribute("password_change_policy", Attribute::string().computed())
        .with_attribute("password_change_plugin", Attribute::string().computed())
        .with_attribute("password_change_plugin_parameters", Attribute::string().computed())
}

impl ApplicationResource {
    fn payload(d: &ResourceData, new_resource: bool, api_version: &str) -> Result<JsonApplication> {
        let mut json = JsonApplication {
            application_name: d.get_string("application_name"),
            connection_policy: d.get_string("connection_policy"),
            description: d.get_string("description"),
            parameters: d.get_string("parameters"),
            ..JsonApplication::default()
        };
        let category = d.get_string("category");
        let supports_category = at_least(api_version, ApiVersion::V3_12);
        if new_resource && supports_category {
            json.category.clone_from(&category);
        }

        match category.as_str() {
            "jumphost" => {
                if !supports_category {
                    return Err(BastionError::validation(format!(
                        "category = jumphost not available with api version {api_version}"
                    )));
                }
                if !d.get_string("target").is_empty() {
                    return Err(refuse("target", "jumphost"));
                }
                if d.get_ok("paths").is_some() {
                    return Err(refuse("paths", "jumphost"));
                }
                if !d.get_string_list("global_domains").is_empty() {
                    return Err(refuse("global_domains", "jumphost"));
                }
                let application_url = d.get_string("application_url");
                if application_url.is_empty() {
                    return Err(require("application_url", "jumphost"));
                }
                let browser = d.get_string("browser");
                if browser.is_empty() {
                    return Err(require("browser", "jumphost"));
                }
                json.application_url = Some(application_url);
                json.browser = Some(browser);
                json.browser_version = Some(d.get_string("browser_version"));
            }
            _ => {
                for field in ["application_url", "browser", "browser_version"] {
                    if !d.get_string(field).is_empty() {
                        return Err(refuse(field, "standard"));
                    }
                }
                let target = d.get_string("target");
                if target.is_empty() {
                    return Err(require("target", "standard"));
                }
                let paths: Vec<JsonApplicationPath> = d.get_blocks("paths")?;
                if paths.is_empty() {
                    return Err(require("paths", "standard"));
                }
                json.target = Some(target);
                json.paths = Some(paths);
                json.global_domains = Some(d.get_string_list("global_domains"));
            }
        }
        Ok(json)
    }

    fn fill(d: &mut ResourceData, json: JsonApplication) -> Result<()> {
        let category = if json.category.is_empty() {
            "standard".to_string()
        } else {
            json.category
        };
        d.set("application_name", json.application_name)?;
        d.set("connection_policy", json.connection_policy)?;
        d.set("category", category)?;
        d.set("application_url", json.application_url.unwrap_or_default())?;
        d.set("browser", json.browser.unwrap_or_default())?;
        d.set("browser_version", json.browser_version.unwrap_or_default())?;
        d.set("description", json.description)?;
        d.set("global_domains", json.global_domains.unwrap_or_default())?;
        d.set("parameters", json.parameters)?;
        d.set("paths", json.paths.unwrap_or_default())?;
        d.set("target", json.target.unwrap_or_default())?;
        let local_domains: Vec<Value> = json
            .local_domains
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                let parameters = v
                    .password_change
                    .password_change_plugin_parameters
                    .map_or(Value::Null, Value::Object);
                json!({
                    "id": v.id,
                    "admin_account": v.password_change.admin_account.unwrap_or_default(),
                    "domain_name": v.domain_name,
                    "description": v.description,
                    "enable_password_change": v.password_change.enable_password_change,
                    "password_change_policy": v.password_change.password_change_policy,
                    "password_change_plugin": v.password_change.password_change_plugin,
                    "password_change_plugin_parameters": json_string(&parameters),
                })
            })
            .collect();
        d.set("local_domains", local_domains)
    }
}

#[async_trait]
impl Resource for ApplicationResource {
    fn name(&self) -> &'static str {
        "application"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("application_name", Attribute::string().required())
            .with_attribute("connection_policy", Attribute::string().required())
            .with_attribute(
                "category",
                Attribute::string().default("standard").force_new().one_of(&CATEGORIES),
            )
            .with_attribute("application_url", Attribute::string().optional())
            .with_attribute("browser", Attribute::string().optional())
            .with_attribute("browser_version", Attribute::string().optional())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("global_domains", Attribute::string_set().optional())
            .with_attribute("parameters", Attribute::string().optional())
            .with_attribute("paths", Attribute::block_set(paths_schema()).optional())
            .with_attribute("target", Attribute::string().optional())
            .with_attribute("local_domains", Attribute::block_list(local_domains_schema()).computed())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d, true, client.api_version())?;
        APPLICATIONS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match APPLICATIONS.fetch::<JsonApplication>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d, false, client.api_version())?;
        APPLICATIONS.update(client, d, &payload).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        APPLICATIONS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        APPLICATIONS.import(client, d, "<application_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(config: Value) -> ResourceData {
        ResourceData::from_config(ApplicationResource.schema(), config.as_object().cloned().unwrap())
    }

    #[test]
    fn test_standard_payload() {
        let d = data(json!({
            "application_name": "notepad",
            "connection_policy": "RDP",
            "target": "srv@local:RDP",
            "paths": [{"target": "Notepad", "program": "notepad.exe"}]
        }));
        let payload = serde_json::to_value(ApplicationResource::payload(&d, true, "v3.12").unwrap()).unwrap();
        assert_eq!(payload["category"], "standard");
        assert_eq!(payload["paths"], json!([{"target": "Notepad", "program": "notepad.exe", "working_dir": ""}]));
        assert_eq!(payload["global_domains"], json!([]));
        assert!(payload.get("browser").is_none());

        let payload = serde_json::to_value(ApplicationResource::payload(&d, true, "v3.8").unwrap()).unwrap();
        assert!(payload.get("category").is_none());
    }

    #[test]
    fn test_standard_requires_target() {
        let d = data(json!({"application_name": "a", "connection_policy": "RDP",
                            "paths": [{"target": "t", "program": "p"}]}));
        let err = ApplicationResource::payload(&d, true, "v3.12").unwrap_err();
        assert_eq!(err.to_string(), "target must be specified when category = standard");
    }

    #[test]
    fn test_jumphost_rules() {
        let d = data(json!({"application_name": "web", "connection_policy": "RDP", "category": "jumphost",
                            "application_url": "https://intranet", "browser": "chrome"}));
        let payload = serde_json::to_value(ApplicationResource::payload(&d, true, "v3.12").unwrap()).unwrap();
        assert_eq!(payload["category"], "jumphost");
        assert_eq!(payload["browser_version"], "");
        assert!(payload.get("paths").is_none());

        let err = ApplicationResource::payload(&d, true, "v3.8").unwrap_err();
        assert_eq!(err.to_string(), "category = jumphost not available with api version v3.8");

        let d = data(json!({"application_name": "web", "connection_policy": "RDP", "category": "jumphost",
                            "application_url": "https://intranet", "browser": "chrome", "target": "t"}));
        let err = ApplicationResource::payload(&d, true, "v3.12").unwrap_err();
        assert_eq!(err.to_string(), "target cannot be configured when category = jumphost");
    }

    #[test]
    fn test_fill_defaults_category() {
        let mut d = ResourceData::for_import(ApplicationResource.schema(), "1");
        let json: JsonApplication = serde_json::from_value(json!({
            "id": "1", "application_name": "a", "connection_policy": "RDP",
            "local_domains": [{"id": "l1", "domain_name": "local", "enable_password_change": false}]
        }))
        .unwrap();
        ApplicationResource::fill(&mut d, json).unwrap();
        let state = d.into_state();
        assert_eq!(state["category"], "standard");
        assert_eq!(state["local_domains"][0]["password_change_plugin_parameters"], "{}");
    }
}
