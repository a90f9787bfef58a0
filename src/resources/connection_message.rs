//! `wallix-bastion_connection_message`: login banners and messages of the day.
//!
//! Messages always exist on the appliance; creating one overwrites the text
//! and destroying one only forgets it.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MESSAGE_NAMES: [&str; 10] = [
    "login_en", "login_fr", "login_de", "login_es", "login_ru", "motd_en", "motd_fr", "motd_de", "motd_es",
    "motd_ru",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonConnectionMessage {
    message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionMessageResource;

fn uri(message_name: &str) -> String {
    format!("/connectionmessages/{message_name}")
}

impl ConnectionMessageResource {
    async fn put(client: &BastionClient, d: &ResourceData) -> Result<()> {
        let payload = JsonConnectionMessage {
            message: d.get_string("message"),
        };
        client.put(&uri(&d.get_string("message_name")), &payload).await
    }
}

#[async_trait]
impl Resource for ConnectionMessageResource {
    fn name(&self) -> &'static str {
        "connection_message"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute(
                "message_name",
                Attribute::string().required().force_new().one_of(&MESSAGE_NAMES),
            )
            .with_attribute("message", Attribute::string().required())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        Self::put(client, d).await?;
        let message_name = d.get_string("message_name");
        d.set_id(message_name);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match client.get_json::<JsonConnectionMessage>(&uri(d.id())).await? {
            Some(json) => {
                let message_name = d.id().to_string();
                d.set("message_name", message_name)?;
                d.set("message", json.message)
            }
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        Self::put(client, d).await
    }

    async fn delete(&self, _client: &BastionClient, d: &ResourceData) -> Result<()> {
        debug!(message_name = d.id(), "connection messages cannot be deleted, leaving the text in place");
        Ok(())
    }

    /// The import ID is the message name itself
    async fn import(&self, _client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let message_name = d.id().to_string();
        d.set("message_name", message_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_name_values() {
        let schema = ConnectionMessageResource.schema();
        assert!(!schema
            .validate(json!({"message_name": "motd_fr", "message": "Bonjour"}).as_object().unwrap())
            .has_errors());
        assert!(schema
            .validate(json!({"message_name": "motd_it", "message": "Ciao"}).as_object().unwrap())
            .has_errors());
    }
}
