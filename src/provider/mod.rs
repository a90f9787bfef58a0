//! # Provider
//!
//! Adapter traits and the registry mapping `wallix-bastion_*` type names to
//! adapters.
//!
//! Each adapter implements either:
//! - [`Resource`] for managed objects (create/read/update/delete/import)
//! - [`DataSource`] for read-only lookups

pub mod lifecycle;

pub use lifecycle::{Action, AttributeChange, Plan};

use crate::client::BastionClient;
use crate::constants::RESOURCE_PREFIX;
use crate::error::{BastionError, Result};
use crate::schema::{ResourceData, Schema};
use crate::version::{check_version, default_versions_valid};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A managed Bastion object
#[async_trait]
pub trait Resource: Send + Sync {
    /// Short name without the `wallix-bastion_` prefix
    fn name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// API versions the adapter works with
    fn versions(&self) -> &'static [&'static str] {
        default_versions_valid()
    }

    /// Extra line appended to the version error (renamed resources)
    fn version_hint(&self, _version: &str) -> Option<&'static str> {
        None
    }

    /// Create the object and set its ID. The caller reads it back afterwards.
    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()>;

    /// Refresh `d` from the appliance; clears the ID when the object is gone.
    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()>;

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()>;

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()>;

    /// Resolve the user supplied import ID (`d.id()`) into the object ID and
    /// set whatever attributes `read` needs to locate the object.
    async fn import(&self, _client: &BastionClient, _d: &mut ResourceData) -> Result<()> {
        Err(BastionError::validation(format!(
            "{RESOURCE_PREFIX}{} does not support import",
            self.name()
        )))
    }
}

/// A read-only lookup
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn versions(&self) -> &'static [&'static str] {
        default_versions_valid()
    }

    /// Fill the computed attributes of `d` and set its ID
    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()>;
}

/// Registry of every resource and data source
pub struct Provider {
    resources: BTreeMap<String, Box<dyn Resource>>,
    data_sources: BTreeMap<String, Box<dyn DataSource>>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// Registry holding every adapter shipped with the crate
    pub fn new() -> Self {
        let mut provider = Self::empty();
        for resource in crate::resources::all() {
            provider.register_resource(resource);
        }
        for data_source in crate::data_sources::all() {
            provider.register_data_source(data_source);
        }
        provider
    }

    pub fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    pub fn register_resource(&mut self, resource: Box<dyn Resource>) {
        self.resources
            .insert(format!("{RESOURCE_PREFIX}{}", resource.name()), resource);
    }

    pub fn register_data_source(&mut self, data_source: Box<dyn DataSource>) {
        self.data_sources
            .insert(format!("{RESOURCE_PREFIX}{}", data_source.name()), data_source);
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn data_source_names(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    /// Look a resource up by its full type name
    ///
    /// # Errors
    /// [`BastionError::UnknownType`] when nothing is registered under `type_name`.
    pub fn resource(&self, type_name: &str) -> Result<&dyn Resource> {
        self.resources
            .get(type_name)
            .map(Box::as_ref)
            .ok_or_else(|| BastionError::UnknownType {
                kind: "resource",
                name: type_name.to_string(),
            })
    }

    /// Look a data source up by its full type name
    ///
    /// # Errors
    /// [`BastionError::UnknownType`] when nothing is registered under `type_name`.
    pub fn data_source(&self, type_name: &str) -> Result<&dyn DataSource> {
        self.data_sources
            .get(type_name)
            .map(Box::as_ref)
            .ok_or_else(|| BastionError::UnknownType {
                kind: "data source",
                name: type_name.to_string(),
            })
    }
}

/// Version gate run before every resource operation
pub(crate) fn gate_resource(resource: &dyn Resource, version: &str) -> Result<()> {
    check_version("resource", resource.name(), version, resource.versions()).map_err(|err| {
        match (err, resource.version_hint(version)) {
            (
                BastionError::UnsupportedVersion {
                    kind,
                    name,
                    version,
                    ..
                },
                Some(hint),
            ) => BastionError::UnsupportedVersion {
                kind,
                name,
                version,
                hint: format!("\n {hint}"),
            },
            (err, _) => err,
        }
    })
}

/// Version gate run before every data source read
pub(crate) fn gate_data_source(data_source: &dyn DataSource, version: &str) -> Result<()> {
    check_version("data source", data_source.name(), version, data_source.versions())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_complete() {
        let provider = Provider::new();
        assert_eq!(provider.resource_names().count(), 35);
        assert_eq!(provider.data_source_names().count(), 5);
        assert!(provider.resource("wallix-bastion_user").is_ok());
        assert!(provider.data_source("wallix-bastion_version").is_ok());
        let err = provider.resource("wallix-bastion_nope").err().unwrap();
        assert_eq!(err.to_string(), "unknown resource wallix-bastion_nope");
    }

    #[test]
    fn test_every_schema_describes() {
        let provider = Provider::new();
        for name in provider.resource_names() {
            let schema = provider.resource(name).unwrap().schema();
            assert!(schema.attributes().count() > 0, "{name} has an empty schema");
        }
    }

    #[test]
    fn test_ldapmapping_hint() {
        let provider = Provider::new();
        let ldapmapping = provider.resource("wallix-bastion_ldapmapping").unwrap();
        let err = gate_resource(ldapmapping, "v3.12").unwrap_err();
        assert!(err
            .to_string()
            .ends_with("not available with api version v3.12\n use wallix-bastion_authdomain_mapping instead"));
        assert!(gate_resource(ldapmapping, "v3.6").is_ok());
    }
}
