//! Configuration documents read by `bastionctl`.
//!
//! ```yaml
//! provider:
//!   ip: bastion.example.com
//!   user: terraform
//! resources:
//!   user.alice:
//!     user_name: alice
//!     email: alice@example.com
//!     profile: user
//!     user_auths: [local_password]
//! data:
//!   version.current: {}
//! ```
//!
//! Provider fields left out fall back to the `WALLIX_BASTION_*` environment.
//! JSON documents are accepted as well since YAML is a superset of JSON.
//! Resources keep the order of the file: they are applied top to bottom and
//! destroyed bottom to top.

use crate::config::ProviderBlock;
use crate::constants::RESOURCE_PREFIX;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// `<type>.<label>`, with `type` always carrying the provider prefix
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub type_name: String,
    pub label: String,
}

impl Address {
    /// Parse `user.alice` or `wallix-bastion_user.alice`
    pub fn parse(address: &str) -> Result<Self> {
        let Some((type_name, label)) = address.split_once('.') else {
            bail!("address {address} must look like <type>.<label>");
        };
        if type_name.is_empty() || label.is_empty() {
            bail!("address {address} must look like <type>.<label>");
        }
        Ok(Self {
            type_name: full_type_name(type_name),
            label: label.to_string(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.label)
    }
}

/// Add the provider prefix when it is missing
pub fn full_type_name(type_name: &str) -> String {
    if type_name.starts_with(RESOURCE_PREFIX) {
        type_name.to_string()
    } else {
        format!("{RESOURCE_PREFIX}{type_name}")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    provider: ProviderBlock,
    #[serde(default)]
    resources: serde_yaml::Mapping,
    #[serde(default)]
    data: serde_yaml::Mapping,
}

/// A parsed configuration file
#[derive(Debug, Default)]
pub struct Document {
    pub provider: ProviderBlock,
    pub resources: Vec<(Address, Map<String, Value>)>,
    pub data: Vec<(Address, Map<String, Value>)>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid configuration {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawDocument = serde_yaml::from_str(text).context("Failed to parse YAML/JSON")?;
        Ok(Self {
            provider: raw.provider,
            resources: blocks("resources", raw.resources)?,
            data: blocks("data", raw.data)?,
        })
    }

    pub fn resource(&self, address: &Address) -> Option<&Map<String, Value>> {
        self.resources
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, config)| config)
    }

    pub fn data_source(&self, address: &Address) -> Option<&Map<String, Value>> {
        self.data
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, config)| config)
    }
}

fn blocks(section: &str, mapping: serde_yaml::Mapping) -> Result<Vec<(Address, Map<String, Value>)>> {
    let mut out: Vec<(Address, Map<String, Value>)> = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let Some(key) = key.as_str() else {
            bail!("{section}: keys must be strings, got {key:?}");
        };
        let address = Address::parse(key).with_context(|| format!("{section}: bad key"))?;
        if out.iter().any(|(a, _)| *a == address) {
            bail!("{section}: {address} is declared twice");
        }
        let config = match serde_json::to_value(value)
            .with_context(|| format!("{section}: {address} is not representable as JSON"))?
        {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => bail!("{section}: {address} must be a map of attributes, got {other}"),
        };
        out.push((address, config));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_adds_prefix() {
        let address = Address::parse("user.alice").unwrap();
        assert_eq!(address.type_name, "wallix-bastion_user");
        assert_eq!(address.to_string(), "wallix-bastion_user.alice");
        assert_eq!(Address::parse("wallix-bastion_user.alice").unwrap(), address);
        assert!(Address::parse("user").is_err());
        assert!(Address::parse("user.").is_err());
    }

    #[test]
    fn test_parse_keeps_file_order() {
        let doc = Document::parse(
            "provider:\n  ip: 10.0.0.1\n  token: t\nresources:\n  usergroup.ops:\n    group_name: ops\n  \
             timeframe.office:\n    timeframe_name: office\ndata:\n  version.current:\n",
        )
        .unwrap();
        assert_eq!(doc.provider.ip.as_deref(), Some("10.0.0.1"));
        let order: Vec<String> = doc.resources.iter().map(|(a, _)| a.to_string()).collect();
        assert_eq!(
            order,
            ["wallix-bastion_usergroup.ops", "wallix-bastion_timeframe.office"]
        );
        assert!(doc.data[0].1.is_empty());
    }

    #[test]
    fn test_parse_accepts_json() {
        let doc = Document::parse(r#"{"resources": {"device.srv1": {"device_name": "srv1", "host": "10.0.0.2"}}}"#)
            .unwrap();
        let address = Address::parse("device.srv1").unwrap();
        assert_eq!(doc.resource(&address).unwrap()["host"], "10.0.0.2");
    }

    #[test]
    fn test_parse_rejects_duplicates_and_scalars() {
        assert!(Document::parse("resources:\n  user.a: {}\n  wallix-bastion_user.a: {}\n").is_err());
        assert!(Document::parse("resources:\n  user.a: 3\n").is_err());
        assert!(Document::parse("outputs: {}\n").is_err());
    }
}
