//! Credential plumbing shared by the account credential resources.
//!
//! An account holds at most one credential per type, so the type doubles as
//! the lookup key.

use crate::client::BastionClient;
use crate::error::Result;
use crate::schema::{Attribute, ResourceData, Schema};
use serde_json::{json, Value};

use super::JsonCredential;

pub(crate) const CREDENTIAL_TYPES: [&str; 2] = ["password", "ssh_key"];

/// Credential attributes, appended to the parent ID attributes of each resource
pub(crate) fn with_credential_attributes(schema: Schema) -> Schema {
    schema
        .with_attribute(
            "type",
            Attribute::string().required().force_new().one_of(&CREDENTIAL_TYPES),
        )
        .with_attribute(
            "passphrase",
            Attribute::string().optional().sensitive().required_with(&["private_key"]),
        )
        .with_attribute("password", Attribute::string().optional().sensitive())
        .with_attribute("private_key", Attribute::string().optional().sensitive().force_new())
        .with_attribute("public_key", Attribute::string().computed())
}

/// Computed credential summaries (`id`, `public_key`, `type`) reported on accounts
pub(crate) fn summary_schema() -> Schema {
    Schema::new()
        .with_attribute("id", Attribute::string().computed())
        .with_attribute("public_key", Attribute::string().computed())
        .with_attribute("type", Attribute::string().computed())
}

pub(crate) fn summaries(credentials: Option<Vec<JsonCredential>>) -> Vec<Value> {
    credentials
        .unwrap_or_default()
        .into_iter()
        .map(|c| json!({"id": c.id, "public_key": c.public_key, "type": c.kind}))
        .collect()
}

pub(crate) fn payload(d: &ResourceData) -> JsonCredential {
    let kind = d.get_string("type");
    let mut json = JsonCredential::default();
    match kind.as_str() {
        "password" => json.password = d.get_string("password"),
        "ssh_key" => {
            json.private_key = d.get_string("private_key");
            json.passphrase = d.get_string("passphrase");
        }
        _ => {}
    }
    json.kind = kind;
    json
}

/// ID of the credential of type `kind` on the account at `account_uri`
pub(crate) async fn search(client: &BastionClient, account_uri: &str, kind: &str) -> Result<Option<String>> {
    client
        .find_in_list(&format!("{account_uri}/credentials/"), "type", kind)
        .await
}

/// Credential `id` of the account; `None` when it is missing or no longer
/// linked to the account (the appliance can keep orphans reachable by ID).
pub(crate) async fn fetch(client: &BastionClient, account_uri: &str, id: &str) -> Result<Option<JsonCredential>> {
    let Some(json) = client
        .get_json::<JsonCredential>(&format!("{account_uri}/credentials/{id}"))
        .await?
    else {
        return Ok(None);
    };
    if json.id.is_empty() {
        return Ok(None);
    }
    let linked = search(client, account_uri, &json.kind).await?;
    Ok((linked.as_deref() == Some(json.id.as_str())).then_some(json))
}

pub(crate) fn fill(d: &mut ResourceData, json: JsonCredential) -> Result<()> {
    d.set("type", json.kind)?;
    d.set("public_key", json.public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(config: serde_json::Value) -> ResourceData {
        let schema = with_credential_attributes(Schema::new().with_attribute("account_id", Attribute::string().required()));
        ResourceData::from_config(schema, config.as_object().cloned().unwrap())
    }

    #[test]
    fn test_payload_by_type() {
        let d = data(json!({"account_id": "a", "type": "password", "password": "pw", "private_key": "k"}));
        assert_eq!(serde_json::to_value(payload(&d)).unwrap(), json!({"type": "password", "password": "pw"}));

        let d = data(json!({"account_id": "a", "type": "ssh_key", "password": "pw", "private_key": "k", "passphrase": "p"}));
        assert_eq!(
            serde_json::to_value(payload(&d)).unwrap(),
            json!({"type": "ssh_key", "private_key": "k", "passphrase": "p"})
        );
    }

    #[test]
    fn test_summaries_keep_public_fields() {
        let creds = vec![JsonCredential {
            id: "c1".to_string(),
            kind: "ssh_key".to_string(),
            public_key: "ssh-ed25519 AAAA".to_string(),
            private_key: "secret".to_string(),
            ..JsonCredential::default()
        }];
        assert_eq!(
            summaries(Some(creds)),
            vec![json!({"id": "c1", "public_key": "ssh-ed25519 AAAA", "type": "ssh_key"})]
        );
        assert!(summaries(None).is_empty());
    }

    #[test]
    fn test_schema_rejects_unknown_type() {
        let d = data(json!({"account_id": "a", "type": "token"}));
        assert!(d.schema().validate(&json!({"account_id": "a", "type": "token"}).as_object().cloned().unwrap()).has_errors());
    }
}
