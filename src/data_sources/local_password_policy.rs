//! `wallix-bastion_local_password_policy`

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::DataSource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct JsonLocalPasswordPolicy {
    allow_same_user_and_password: bool,
    id: String,
    password_expiration: i64,
    password_warning_days: i64,
    password_min_length: i64,
    password_min_lower_chars: i64,
    password_min_upper_chars: i64,
    password_min_digit_chars: i64,
    password_min_special_chars: i64,
    last_passwords_to_reject: i64,
    max_auth_failures: i64,
    ssh_rsa_min_length: i64,
    forbidden_passwords: Vec<String>,
    ssh_key_algos_allowed: Vec<String>,
}

const COUNTERS: [&str; 10] = [
    "last_passwords_to_reject",
    "max_auth_failures",
    "password_expiration",
    "password_min_digit_chars",
    "password_min_length",
    "password_min_lower_chars",
    "password_min_special_chars",
    "password_min_upper_chars",
    "password_warning_days",
    "ssh_rsa_min_length",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPasswordPolicyDataSource;

#[async_trait]
impl DataSource for LocalPasswordPolicyDataSource {
    fn name(&self) -> &'static str {
        "local_password_policy"
    }

    fn schema(&self) -> Schema {
        let schema = Schema::new()
            .with_attribute("password_policy_name", Attribute::string().default("default"))
            .with_attribute("allow_same_user_and_password", Attribute::bool().computed())
            .with_attribute("forbidden_passwords", Attribute::string_set().computed())
            .with_attribute("ssh_key_algos_allowed", Attribute::string_set().computed());
        COUNTERS
            .iter()
            .fold(schema, |schema, key| schema.with_attribute(*key, Attribute::int().computed()))
    }

    /// The first policy matching the name wins
    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let name = d.get_string("password_policy_name");
        let results: Vec<JsonLocalPasswordPolicy> = client
            .get_required(&format!("/localpasswordpolicies/?q=password_policy_name={name}"))
            .await?;
        let json = results.into_iter().next().ok_or(BastionError::NotFound {
            field: "password_policy_name",
            name,
        })?;
        d.set("allow_same_user_and_password", json.allow_same_user_and_password)?;
        d.set("password_expiration", json.password_expiration)?;
        d.set("password_warning_days", json.password_warning_days)?;
        d.set("password_min_length", json.password_min_length)?;
        d.set("password_min_lower_chars", json.password_min_lower_chars)?;
        d.set("password_min_upper_chars", json.password_min_upper_chars)?;
        d.set("password_min_digit_chars", json.password_min_digit_chars)?;
        d.set("password_min_special_chars", json.password_min_special_chars)?;
        d.set("last_passwords_to_reject", json.last_passwords_to_reject)?;
        d.set("max_auth_failures", json.max_auth_failures)?;
        d.set("ssh_rsa_min_length", json.ssh_rsa_min_length)?;
        d.set("forbidden_passwords", json.forbidden_passwords)?;
        d.set("ssh_key_algos_allowed", json.ssh_key_algos_allowed)?;
        d.set_id(json.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_policy_name_defaults() {
        let d = ResourceData::from_config(LocalPasswordPolicyDataSource.schema(), Map::new());
        assert_eq!(d.get_string("password_policy_name"), "default");
    }
}
