//! # Wallix Bastion provider
//!
//! Resource and data-source adapters for the Wallix Bastion PAM REST API,
//! with a small schema/state layer and a lifecycle engine that plans and
//! applies configurations against an appliance.
//!
//! ```ignore
//! let config = ProviderConfig::from_env();
//! let client = BastionClient::new(&config)?;
//! let provider = Provider::new();
//! let state = provider
//!     .apply(&client, "wallix-bastion_user", &user_config, None)
//!     .await?;
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod data_sources;
pub mod error;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod version;

pub use client::BastionClient;
pub use config::{ProviderBlock, ProviderConfig};
pub use error::{BastionError, Result};
pub use provider::{DataSource, Provider, Resource};
pub use schema::{Attribute, ResourceData, Schema};
