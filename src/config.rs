//! # Provider Configuration
//!
//! Connection settings for a Bastion appliance. Every field may come from the
//! `provider` block of a configuration file; missing fields fall back to the
//! `WALLIX_BASTION_*` environment variables and then to built-in defaults.

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_PORT, DEFAULT_USER, ENV_API_VERSION, ENV_HOST, ENV_PASSWORD,
    ENV_PORT, ENV_TOKEN, ENV_USER, KNOWN_API_VERSIONS,
};
use crate::error::{BastionError, Result};
use serde::{Deserialize, Serialize};

/// `provider` block as written in a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Resolved provider configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Appliance address (IP or DNS name)
    pub ip: String,
    /// HTTPS port
    pub port: u16,
    /// API key; when set it takes precedence over `password`
    pub token: Option<String>,
    /// API user
    pub user: String,
    /// Password for HTTP Basic authentication
    pub password: Option<String>,
    /// API version used as URL prefix (`v3.3`, `v3.12`, ...)
    pub api_version: String,
    /// Replaces `https://<ip>:<port>/api` when set. Used against mock servers.
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_block(ProviderBlock::default())
    }

    /// Merge an explicit `provider` block over the environment
    pub fn from_block(block: ProviderBlock) -> Self {
        Self {
            ip: block
                .ip
                .unwrap_or_else(|| env_var_or_default_str(ENV_HOST, "")),
            port: block
                .port
                .unwrap_or_else(|| env_var_or_default(ENV_PORT, DEFAULT_PORT)),
            token: block.token.or_else(|| env_var_opt(ENV_TOKEN)),
            user: block
                .user
                .unwrap_or_else(|| env_var_or_default_str(ENV_USER, DEFAULT_USER)),
            password: block.password.or_else(|| env_var_opt(ENV_PASSWORD)),
            api_version: block
                .api_version
                .unwrap_or_else(|| env_var_or_default_str(ENV_API_VERSION, DEFAULT_API_VERSION)),
            base_url: None,
        }
    }

    /// Point the client at another base URL (mock servers in tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Check the configuration is usable before building a client
    ///
    /// # Errors
    /// Returns [`BastionError::InvalidConfig`] when the address is empty, the
    /// port is zero, no credential is set, or the API version is unknown.
    pub fn validate(&self) -> Result<()> {
        if self.ip.is_empty() && self.base_url.is_none() {
            return Err(BastionError::InvalidConfig(format!(
                "ip must be set (or {ENV_HOST})"
            )));
        }
        if self.port == 0 {
            return Err(BastionError::InvalidConfig(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        if self.token.as_deref().unwrap_or_default().is_empty()
            && self.password.as_deref().unwrap_or_default().is_empty()
        {
            return Err(BastionError::InvalidConfig(format!(
                "one of token ({ENV_TOKEN}) or password ({ENV_PASSWORD}) must be set"
            )));
        }
        if !KNOWN_API_VERSIONS.contains(&self.api_version.as_str()) {
            return Err(BastionError::InvalidConfig(format!(
                "api_version {} is not one of {}",
                self.api_version,
                KNOWN_API_VERSIONS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a non-empty environment variable
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
