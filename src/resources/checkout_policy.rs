//! `wallix-bastion_checkout_policy`

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const CHECKOUT_POLICIES: NamedCollection = NamedCollection::new("/checkoutpolicies/", "checkout_policy_name");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonCheckoutPolicy {
    change_credentials_at_checkin: bool,
    enable_lock: bool,
    duration: i64,
    extension: i64,
    max_duration: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    checkout_policy_name: String,
    description: String,
}

has_id!(JsonCheckoutPolicy);

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutPolicyResource;

impl CheckoutPolicyResource {
    fn payload(d: &ResourceData) -> JsonCheckoutPolicy {
        JsonCheckoutPolicy {
            checkout_policy_name: d.get_string("checkout_policy_name"),
            description: d.get_string("description"),
            enable_lock: d.get_bool("enable_lock"),
            change_credentials_at_checkin: d.get_bool("change_credentials_at_checkin"),
            duration: d.get_int("duration"),
            extension: d.get_int("extension"),
            max_duration: d.get_int("max_duration"),
            ..JsonCheckoutPolicy::default()
        }
    }
}

#[async_trait]
impl Resource for CheckoutPolicyResource {
    fn name(&self) -> &'static str {
        "checkout_policy"
    }

    fn schema(&self) -> Schema {
        let with_lock = |attr: Attribute| attr.optional().required_with(&["enable_lock"]);
        Schema::new()
            .with_attribute("checkout_policy_name", Attribute::string().required())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute(
                "enable_lock",
                Attribute::bool().optional().required_with(&["duration", "max_duration"]),
            )
            .with_attribute("change_credentials_at_checkin", with_lock(Attribute::bool()))
            .with_attribute("duration", with_lock(Attribute::int()))
            .with_attribute("extension", with_lock(Attribute::int()))
            .with_attribute("max_duration", with_lock(Attribute::int()))
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        CHECKOUT_POLICIES.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = CHECKOUT_POLICIES.fetch::<JsonCheckoutPolicy>(client, d.id()).await? else {
            d.set_id("");
            return Ok(());
        };
        d.set("checkout_policy_name", json.checkout_policy_name)?;
        d.set("description", json.description)?;
        d.set("enable_lock", json.enable_lock)?;
        d.set("change_credentials_at_checkin", json.change_credentials_at_checkin)?;
        d.set("duration", json.duration)?;
        d.set("extension", json.extension)?;
        d.set("max_duration", json.max_duration)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        CHECKOUT_POLICIES.update(client, d, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        CHECKOUT_POLICIES.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        CHECKOUT_POLICIES.import(client, d, "<checkout_policy_name>").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lock_settings_need_enable_lock() {
        let schema = CheckoutPolicyResource.schema();
        let diags = schema.validate(json!({"checkout_policy_name": "p", "duration": 60}).as_object().unwrap());
        assert!(diags.has_errors());
        let diags = schema.validate(
            json!({"checkout_policy_name": "p", "enable_lock": true, "duration": 60, "max_duration": 120})
                .as_object()
                .unwrap(),
        );
        assert!(!diags.has_errors());
    }
}
