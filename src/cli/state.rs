//! Local state file written by `bastionctl`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const STATE_FORMAT_VERSION: u32 = 1;

/// State of one managed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// `<type>.<label>`
    pub address: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub version: u32,
    /// In application order
    #[serde(default)]
    pub resources: Vec<ResourceState>,
    #[serde(default)]
    pub data: BTreeMap<String, Map<String, Value>>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_FORMAT_VERSION,
            resources: Vec::new(),
            data: BTreeMap::new(),
        }
    }
}

impl State {
    /// Load the state; a missing file is an empty state
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file yet");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state {}", path.display()))?;
        let state: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse state {}", path.display()))?;
        if state.version != STATE_FORMAT_VERSION {
            bail!(
                "state {} has format version {}, expected {STATE_FORMAT_VERSION}",
                path.display(),
                state.version
            );
        }
        Ok(state)
    }

    /// Write through a temporary file so an interrupted run keeps the old state
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        let tmp = temporary_path(path);
        std::fs::write(&tmp, text + "\n")
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state {}", path.display()))
    }

    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.address == address)
    }

    /// Insert or replace, keeping the original position of an existing entry
    pub fn put(&mut self, resource: ResourceState) {
        match self.resources.iter_mut().find(|r| r.address == resource.address) {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        let index = self.resources.iter().position(|r| r.address == address)?;
        Some(self.resources.remove(index))
    }

    pub fn addresses(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.address.clone()).collect()
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(address: &str, name: &str) -> ResourceState {
        ResourceState {
            address: address.to_string(),
            type_name: "wallix-bastion_user".to_string(),
            attributes: json!({"id": name, "user_name": name}).as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(state, State::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bastion.tfstate.json");
        let mut state = State::default();
        state.put(user("wallix-bastion_user.alice", "alice"));
        state.put(user("wallix-bastion_user.bob", "bob"));
        state.save(&path).unwrap();
        assert!(!dir.path().join("bastion.tfstate.json.tmp").exists());

        let loaded = State::load(&path).unwrap();
        assert_eq!(loaded.addresses(), ["wallix-bastion_user.alice", "wallix-bastion_user.bob"]);
        assert_eq!(loaded.get("wallix-bastion_user.bob"), Some(&user("wallix-bastion_user.bob", "bob")));
    }

    #[test]
    fn test_put_keeps_position() {
        let mut state = State::default();
        state.put(user("a.x", "x"));
        state.put(user("b.y", "y"));
        state.put(user("a.x", "z"));
        assert_eq!(state.addresses(), ["a.x", "b.y"]);
        assert_eq!(state.get("a.x").unwrap().attributes["id"], "z");
        assert!(state.remove("a.x").is_some());
        assert!(state.remove("a.x").is_none());
    }

    #[test]
    fn test_rejects_other_format_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version": 9, "resources": []}"#).unwrap();
        assert!(State::load(&path).is_err());
    }
}
