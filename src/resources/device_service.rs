//! `wallix-bastion_device_service`: services (protocol endpoints) of a device.

use crate::client::BastionClient;
use crate::constants::PROTOCOLS;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{already_exists, device, not_found_after_post, split_import_id};

const SSH_SUBPROTOCOLS: [&str; 9] = [
    "SSH_SHELL_SESSION",
    "SSH_REMOTE_COMMAND",
    "SSH_SCP_UP",
    "SSH_SCP_DOWN",
    "SSH_X11",
    "SFTP_SESSION",
    "SSH_DIRECT_TCPIP",
    "SSH_REVERSE_TCPIP",
    "SSH_AUTH_AGENT",
];

const RDP_SUBPROTOCOLS: [&str; 8] = [
    "RDP_CLIPBOARD_UP",
    "RDP_CLIPBOARD_DOWN",
    "RDP_CLIPBOARD_FILE",
    "RDP_PRINTER",
    "RDP_COM_PORT",
    "RDP_DRIVE",
    "RDP_SMARTCARD",
    "RDP_AUDIO_OUTPUT",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDeviceService {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    service_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    protocol: String,
    port: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    subprotocols: Option<Vec<String>>,
    connection_policy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    global_domains: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceServiceResource;

async fn search(client: &BastionClient, device_id: &str, service_name: &str) -> Result<Option<String>> {
    client
        .search_by_scan(&format!("/devices/{device_id}/services/"), "service_name", service_name)
        .await
}

/// Check `subprotocols` against the service protocol
fn check_subprotocols(protocol: &str, subprotocols: &[String]) -> Result<()> {
    let allowed: &[&str] = match protocol {
        "SSH" => &SSH_SUBPROTOCOLS,
        "RDP" => &RDP_SUBPROTOCOLS,
        other => {
            return Err(BastionError::validation(format!(
                "subprotocols need to not set for {other} service"
            )))
        }
    };
    match subprotocols.iter().find(|s| !allowed.contains(&s.as_str())) {
        Some(invalid) => Err(BastionError::validation(format!(
            "subprotocols {invalid} not valid for {protocol} service"
        ))),
        None => Ok(()),
    }
}

impl DeviceServiceResource {
    fn payload(d: &ResourceData, new_resource: bool) -> Result<JsonDeviceService> {
        let protocol = d.get_string("protocol");
        let mut json = JsonDeviceService {
            connection_policy: d.get_string("connection_policy"),
            port: d.get_int("port"),
            global_domains: d.get_string_list("global_domains"),
            ..JsonDeviceService::default()
        };
        let subprotocols = d.get_string_list("subprotocols");
        if !subprotocols.is_empty() {
            check_subprotocols(&protocol, &subprotocols)?;
            json.subprotocols = Some(subprotocols);
        }
        if new_resource {
            json.service_name = d.get_string("service_name");
            json.protocol = protocol;
        }
        Ok(json)
    }

    fn collection(d: &ResourceData) -> String {
        format!("/devices/{}/services/", d.get_string("device_id"))
    }
}

#[async_trait]
impl Resource for DeviceServiceResource {
    fn name(&self) -> &'static str {
        "device_service"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("device_id", Attribute::string().required().force_new())
            .with_attribute("service_name", Attribute::string().required().force_new())
            .with_attribute("connection_policy", Attribute::string().required())
            .with_attribute("port", Attribute::int().required().int_between(1, 65535))
            .with_attribute(
                "protocol",
                Attribute::string().required().force_new().one_of(&PROTOCOLS),
            )
            .with_attribute("global_domains", Attribute::string_list().optional())
            .with_attribute("subprotocols", Attribute::string_list().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let device_id = d.get_string("device_id");
        let service_name = d.get_string("service_name");
        device::ensure_exists(client, &device_id).await?;
        let described = format!("{service_name} on device_id {device_id}");
        if search(client, &device_id, &service_name).await?.is_some() {
            return Err(already_exists("service_name", described));
        }
        client
            .post(&Self::collection(d), &Self::payload(d, true)?)
            .await?;
        let id = search(client, &device_id, &service_name)
            .await?
            .ok_or_else(|| not_found_after_post("service_name", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}", Self::collection(d), d.id());
        match client.get_json::<JsonDeviceService>(&uri).await? {
            Some(json) if !json.id.is_empty() => {
                d.set("service_name", json.service_name)?;
                d.set("connection_policy", json.connection_policy)?;
                d.set("port", json.port)?;
                d.set("protocol", json.protocol)?;
                d.set("global_domains", json.global_domains)?;
                d.set("subprotocols", json.subprotocols.unwrap_or_default())
            }
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    /// The services endpoint takes updates as a forced POST on the object
    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}?force=true", Self::collection(d), d.id());
        client.post(&uri, &Self::payload(d, false)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client
            .delete(&format!("{}{}", Self::collection(d), d.id()))
            .await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<device_id>/<service_name>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 2, EXPECTED)?;
        let id = search(client, parts[0], parts[1])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "service_name",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("device_id", parts[0])?;
        d.set_id(id);
        Ok(())
    }
}
