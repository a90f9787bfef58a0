//! `wallix-bastion_device`: target hosts. Local domains and services are
//! managed by their own resources and only reported here.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::collection::{has_id, NamedCollection};
use super::json_string;

const DEVICES: NamedCollection = NamedCollection::new("/devices/", "device_name").scanned();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDeviceLocalDomainSummary {
    id: String,
    domain_name: String,
    admin_account: Option<String>,
    ca_public_key: String,
    description: String,
    enable_password_change: bool,
    password_change_policy: String,
    password_change_plugin: String,
    password_change_plugin_parameters: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDeviceServiceSummary {
    id: String,
    service_name: String,
    connection_policy: String,
    port: i64,
    protocol: String,
    global_domains: Vec<String>,
    subprotocols: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDevice {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    alias: String,
    description: String,
    device_name: String,
    host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    last_connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_domains: Option<Vec<JsonDeviceLocalDomainSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<Vec<JsonDeviceServiceSummary>>,
}

has_id!(JsonDevice);

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceResource;

/// ID of the device named `device_name`
/// Fail unless the device exists
pub(crate) async fn ensure_exists(client: &BastionClient, device_id: &str) -> Result<()> {
    super::ensure_parent(client, "device", &DEVICES.object_uri(device_id), device_id).await
}

fn local_domains_schema() -> Schema {
    Schema::new()
        .with_attribute("id", Attribute::string().computed())
        .with_attribute("domain_name", Attribute::string().computed())
        .with_attribute("admin_account", Attribute::string().computed())
        .with_attribute("ca_public_key", Attribute::string().computed())
        .with_attribute("description", Attribute::string().computed())
        .with_attribute("enable_password_change", Attribute::bool().computed())
        .with_attribute("password_change_policy", Attribute::string().computed())
        .with_attribute("password_change_plugin", Attribute::string().computed())
        .with_attribute("password_change_plugin_parameters", Attribute::string().computed())
}

fn services_schema() -> Schema {
    Schema::new()
        .with_attribute("id", Attribute::string().computed())
        .with_attribute("service_name", Attribute::string().computed())
        .with_attribute("connection_policy", Attribute::string().computed())
        .with_attribute("port", Attribute::int().computed())
        .with_attribute("protocol", Attribute::string().computed())
        .with_attribute("global_domains", Attribute::string_list().computed())
        .with_attribute("subprotocols", Attribute::string_list().computed())
}

impl DeviceResource {
    fn payload(d: &ResourceData) -> JsonDevice {
        JsonDevice {
            device_name: d.get_string("device_name"),
            host: d.get_string("host"),
            alias: d.get_string("alias"),
            description: d.get_string("description"),
            ..JsonDevice::default()
        }
    }

    fn fill(d: &mut ResourceData, json: JsonDevice) -> Result<()> {
        d.set("device_name", json.device_name)?;
        d.set("host", json.host)?;
        d.set("alias", json.alias)?;
        d.set("description", json.description)?;
        let local_domains: Vec<Value> = json
            .local_domains
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                json!({
                    "id": v.id,
                    "domain_name": v.domain_name,
                    "admin_account": v.admin_account.unwrap_or_default(),
                    "ca_public_key": v.ca_public_key,
                    "description": v.description,
                    "enable_password_change": v.enable_password_change,
                    "password_change_policy": v.password_change_policy,
                    "password_change_plugin": v.password_change_plugin,
                    "password_change_plugin_parameters": json_string(
                        &v.password_change_plugin_parameters.map(Value::Object).unwrap_or(Value::Null)
                    ),
                })
            })
            .collect();
        d.set("local_domains", local_domains)?;
        let services: Vec<Value> = json
            .services
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                json!({
                    "id": v.id,
                    "service_name": v.service_name,
                    "connection_policy": v.connection_policy,
                    "port": v.port,
                    "protocol": v.protocol,
                    "global_domains": v.global_domains,
                    "subprotocols": v.subprotocols.unwrap_or_default(),
                })
            })
            .collect();
        d.set("services", services)
    }
}

#[async_trait]
impl Resource for DeviceResource {
    fn name(&self) -> &'static str {
        "device"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("device_name", Attribute::string().required())
            .with_attribute("host", Attribute::string().required())
            .with_attribute("alias", Attribute::string().optional())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("local_domains", Attribute::block_list(local_domains_schema()).computed())
            .with_attribute("services", Attribute::block_list(services_schema()).computed())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        DEVICES.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match DEVICES.fetch::<JsonDevice>(client, d.id()).await? {
            Some(json) => Self::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        DEVICES.update(client, d, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        DEVICES.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        DEVICES.import(client, d, "<device_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_reports_nested_objects() {
        let mut d = ResourceData::for_import(DeviceResource.schema(), "dev1");
        let json: JsonDevice = serde_json::from_value(json!({
            "id": "dev1",
            "device_name": "srv",
            "host": "10.0.0.2",
            "local_domains": [{"id": "ld1", "domain_name": "local", "password_change_plugin_parameters": {"a": 1}}],
            "services": [{"id": "s1", "service_name": "ssh", "port": 22, "protocol": "SSH", "global_domains": ["corp"]}]
        }))
        .unwrap();
        DeviceResource::fill(&mut d, json).unwrap();
        let state = d.into_state();
        assert_eq!(state["local_domains"][0]["password_change_plugin_parameters"], "{\"a\":1}");
        assert_eq!(state["services"][0]["subprotocols"], json!([]));
        assert_eq!(state["services"][0]["port"], 22);
    }

    #[test]
    fn test_payload_omits_computed_fields() {
        let d = ResourceData::from_config(
            DeviceResource.schema(),
            json!({"device_name": "srv", "host": "h"}).as_object().cloned().unwrap(),
        );
        let payload = serde_json::to_value(DeviceResource::payload(&d)).unwrap();
        assert!(payload.get("local_domains").is_none());
        assert!(payload.get("id").is_none());
        assert_eq!(payload["alias"], "");
    }
}
