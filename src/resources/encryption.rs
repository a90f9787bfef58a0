//! `wallix-bastion_encryption`: the appliance encryption passphrase.
//!
//! Singleton with the fixed ID [`ENCRYPTION_ID`]. The appliance never
//! returns the passphrases, so state keeps the configured values.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use crate::version::{at_least, ApiVersion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const URI: &str = "/encryption";

pub const ENCRYPTION_ID: &str = "encryption";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonEncryption {
    #[serde(skip_serializing_if = "String::is_empty")]
    passphrase: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    new_passphrase: String,
}

/// Whether the encryption status reported by the appliance means "set up".
///
/// v3.12 reports a `sealed_state`, v3.8 an `encryption` state; older
/// versions have no status and count as ready once the endpoint answers.
fn is_ready(api_version: &str, status: &Value) -> bool {
    let field = |key: &str| status.get(key).and_then(Value::as_str).unwrap_or_default();
    if at_least(api_version, ApiVersion::V3_12) {
        field("sealed_state") == "unsealed"
    } else if at_least(api_version, ApiVersion::V3_8) {
        field("encryption") == "ready"
    } else {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptionResource;

#[async_trait]
impl Resource for EncryptionResource {
    fn name(&self) -> &'static str {
        "encryption"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("current_passphrase", Attribute::string().optional().sensitive())
            .with_attribute("new_passphrase", Attribute::string().required().sensitive())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = JsonEncryption {
            new_passphrase: d.get_string("new_passphrase"),
            ..JsonEncryption::default()
        };
        client.put(URI, &payload).await?;
        d.set_id(ENCRYPTION_ID);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let status = client.get_required::<Value>(URI).await?;
        if !is_ready(client.api_version(), &status) {
            debug!(?status, "encryption is not set up");
            d.set_id("");
        }
        Ok(())
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        if !d.has_change("current_passphrase") && !d.has_change("new_passphrase") {
            return Ok(());
        }
        let payload = JsonEncryption {
            passphrase: d.get_string("current_passphrase"),
            new_passphrase: d.get_string("new_passphrase"),
        };
        client.put(URI, &payload).await
    }

    /// The appliance cannot drop its passphrase; only state forgets it
    async fn delete(&self, _client: &BastionClient, _d: &ResourceData) -> Result<()> {
        Ok(())
    }

    async fn import(&self, _client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        d.set_id(ENCRYPTION_ID);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_readiness_by_version() {
        assert!(is_ready("v3.12", &json!({"sealed_state": "unsealed"})));
        assert!(!is_ready("v3.12", &json!({"sealed_state": "sealed", "encryption": "ready"})));
        assert!(is_ready("v3.8", &json!({"encryption": "ready"})));
        assert!(!is_ready("v3.8", &json!({"encryption": "not_ready"})));
        assert!(is_ready("v3.6", &json!({})));
    }
}
