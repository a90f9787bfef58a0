//! `wallix-bastion_version`: the appliance and API versions.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::DataSource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use tracing::debug;

const ATTRIBUTES: [&str; 7] = [
    "version",
    "version_decimal",
    "wab_version",
    "wab_version_decimal",
    "wab_version_hotfix",
    "wab_version_hotfix_decimal",
    "wab_complete_version",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionDataSource;

#[async_trait]
impl DataSource for VersionDataSource {
    fn name(&self) -> &'static str {
        "version"
    }

    fn schema(&self) -> Schema {
        ATTRIBUTES
            .iter()
            .fold(Schema::new(), |schema, key| schema.with_attribute(*key, Attribute::string().computed()))
    }

    /// Decimal versions are exposed as strings
    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let info = client.version().await?;
        debug!(version = %info.version, wab_version = %info.wab_complete_version, "appliance version");
        d.set("version", info.version)?;
        d.set("version_decimal", info.version_decimal.to_string())?;
        d.set("wab_version", info.wab_version)?;
        d.set("wab_version_decimal", info.wab_version_decimal.to_string())?;
        d.set("wab_version_hotfix", info.wab_version_hotfix)?;
        d.set("wab_version_hotfix_decimal", info.wab_version_hotfix_decimal.to_string())?;
        d.set("wab_complete_version", info.wab_complete_version)?;
        d.set_id("version");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_attribute_is_a_computed_string() {
        let schema = VersionDataSource.schema();
        assert_eq!(schema.attributes().count(), ATTRIBUTES.len());
        for key in ATTRIBUTES {
            let attr = schema.get(key).unwrap();
            assert!(attr.computed && !attr.is_configurable(), "{key}");
            assert_eq!(attr.default_or_zero(), serde_json::json!(""), "{key}");
        }
        assert!(!schema.validate(&serde_json::Map::new()).has_errors());
    }
}
