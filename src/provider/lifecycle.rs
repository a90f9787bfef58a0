//! # Lifecycle
//!
//! Plan and apply engine driving the adapters the way Terraform core would:
//! validate, diff configuration against prior state, then create, update,
//! replace or destroy, reading the object back after every mutation.

use super::{gate_data_source, gate_resource, Provider, Resource};
use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::schema::resource_data::normalize_set;
use crate::schema::{AttributeType, Diagnostics, Element, ResourceData};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// What applying a plan will do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    /// Destroy then create, a `force_new` attribute changed
    Replace,
    NoOp,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::NoOp => "no-op",
        })
    }
}

/// One attribute whose desired value differs from the prior state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub before: Value,
    pub after: Value,
    pub force_new: bool,
    pub sensitive: bool,
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.force_new { " (forces replacement)" } else { "" };
        if self.sensitive {
            write!(f, "{}: (sensitive value){marker}", self.attribute)
        } else {
            write!(f, "{}: {} -> {}{marker}", self.attribute, self.before, self.after)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub resource_type: String,
    pub action: Action,
    pub changes: Vec<AttributeChange>,
}

impl Provider {
    /// Check a resource configuration without touching the appliance
    ///
    /// # Errors
    /// When the type is unknown.
    pub fn validate_resource(&self, type_name: &str, config: &Map<String, Value>) -> Result<Diagnostics> {
        Ok(self.resource(type_name)?.schema().validate(config))
    }

    /// Check a data source configuration without touching the appliance
    ///
    /// # Errors
    /// When the type is unknown.
    pub fn validate_data_source(&self, type_name: &str, config: &Map<String, Value>) -> Result<Diagnostics> {
        Ok(self.data_source(type_name)?.schema().validate(config))
    }

    /// Diff `config` against `prior` state
    ///
    /// # Errors
    /// Unknown type, unsupported API version, or an invalid configuration.
    pub fn plan(
        &self,
        client: &BastionClient,
        type_name: &str,
        config: &Map<String, Value>,
        prior: Option<&Map<String, Value>>,
    ) -> Result<Plan> {
        let resource = self.resource(type_name)?;
        gate_resource(resource, client.api_version())?;
        let schema = resource.schema();
        schema.validate(config).into_result()?;

        let Some(prior) = prior else {
            return Ok(Plan {
                resource_type: type_name.to_string(),
                action: Action::Create,
                changes: Vec::new(),
            });
        };

        let mut changes = Vec::new();
        for (name, attr) in schema.attributes() {
            if !attr.is_configurable() {
                continue;
            }
            let configured = config.get(name).filter(|v| !v.is_null());
            if configured.is_none() && attr.computed {
                continue;
            }
            let after = complete_blocks(
                &attr.ty,
                configured.cloned().unwrap_or_else(|| attr.default_or_zero()),
            );
            let before = complete_blocks(
                &attr.ty,
                prior
                    .get(name)
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| attr.ty.zero()),
            );
            let same = match attr.ty {
                AttributeType::Set(_) => normalize_set(&before) == normalize_set(&after),
                AttributeType::String if attr.is_json() => same_json(&before, &after),
                _ => before == after,
            };
            if !same {
                changes.push(AttributeChange {
                    attribute: name.to_string(),
                    before,
                    after,
                    force_new: attr.force_new,
                    sensitive: attr.sensitive,
                });
            }
        }

        let action = if changes.is_empty() {
            Action::NoOp
        } else if changes.iter().any(|c| c.force_new) {
            Action::Replace
        } else {
            Action::Update
        };
        debug!(resource = type_name, %action, changes = changes.len(), "planned");
        Ok(Plan {
            resource_type: type_name.to_string(),
            action,
            changes,
        })
    }

    /// Plan then execute; returns the new state
    ///
    /// # Errors
    /// Planning errors, adapter errors, or an object that cannot be read back.
    pub async fn apply(
        &self,
        client: &BastionClient,
        type_name: &str,
        config: &Map<String, Value>,
        prior: Option<&Map<String, Value>>,
    ) -> Result<Map<String, Value>> {
        let plan = self.plan(client, type_name, config, prior)?;
        let resource = self.resource(type_name)?;
        match (plan.action, prior) {
            (Action::NoOp, Some(prior)) => Ok(prior.clone()),
            (Action::Update, Some(prior)) => {
                let mut d = ResourceData::for_update(resource.schema(), prior.clone(), config.clone());
                info!(resource = type_name, id = d.id(), "updating");
                resource.update(client, &mut d).await?;
                read_back(resource, client, type_name, d).await
            }
            (Action::Replace, Some(prior)) => {
                self.destroy(client, type_name, prior).await?;
                create(resource, client, type_name, config).await
            }
            _ => create(resource, client, type_name, config).await,
        }
    }

    /// Read the object again; `None` when it disappeared
    ///
    /// # Errors
    /// Unknown type, unsupported API version, or an adapter error.
    pub async fn refresh(
        &self,
        client: &BastionClient,
        type_name: &str,
        state: &Map<String, Value>,
    ) -> Result<Option<Map<String, Value>>> {
        let resource = self.resource(type_name)?;
        gate_resource(resource, client.api_version())?;
        let mut d = ResourceData::from_state(resource.schema(), state.clone());
        debug!(resource = type_name, id = d.id(), "refreshing");
        resource.read(client, &mut d).await?;
        if d.id().is_empty() {
            warn!(resource = type_name, "object is gone from the appliance");
            return Ok(None);
        }
        Ok(Some(d.into_state()))
    }

    /// Delete the object described by `state`
    ///
    /// # Errors
    /// Unknown type, unsupported API version, or an adapter error.
    pub async fn destroy(&self, client: &BastionClient, type_name: &str, state: &Map<String, Value>) -> Result<()> {
        let resource = self.resource(type_name)?;
        gate_resource(resource, client.api_version())?;
        let d = ResourceData::from_state(resource.schema(), state.clone());
        info!(resource = type_name, id = d.id(), "deleting");
        resource.delete(client, &d).await
    }

    /// Bring an existing object under management
    ///
    /// # Errors
    /// Unknown type, unsupported API version, malformed import ID, or an
    /// object that cannot be found.
    pub async fn import(&self, client: &BastionClient, type_name: &str, import_id: &str) -> Result<Map<String, Value>> {
        let resource = self.resource(type_name)?;
        gate_resource(resource, client.api_version())?;
        let mut d = ResourceData::for_import(resource.schema(), import_id);
        info!(resource = type_name, import_id, "importing");
        resource.import(client, &mut d).await?;
        read_back(resource, client, type_name, d).await
    }

    /// Evaluate a data source
    ///
    /// # Errors
    /// Unknown type, unsupported API version, invalid configuration, or an
    /// adapter error.
    pub async fn read_data_source(
        &self,
        client: &BastionClient,
        type_name: &str,
        config: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let data_source = self.data_source(type_name)?;
        gate_data_source(data_source, client.api_version())?;
        let schema = data_source.schema();
        schema.validate(config).into_result()?;
        let mut d = ResourceData::from_config(schema, config.clone());
        debug!(data_source = type_name, "reading");
        data_source.read(client, &mut d).await?;
        Ok(d.into_state())
    }
}

/// Fill the unset attributes of nested blocks with their defaults so a
/// configured block compares equal to the same block read back.
fn complete_blocks(ty: &AttributeType, value: Value) -> Value {
    let (AttributeType::List(Element::Block(nested))
    | AttributeType::Set(Element::Block(nested))) = ty
    else {
        return value;
    };
    let Value::Array(items) = value else {
        return value;
    };
    Value::Array(
        items
            .into_iter()
            .map(|item| match item {
                Value::Object(mut obj) => {
                    for (name, attr) in nested.attributes() {
                        let current = obj.remove(name).filter(|v| !v.is_null());
                        let filled = current.unwrap_or_else(|| attr.default_or_zero());
                        obj.insert(name.to_string(), complete_blocks(&attr.ty, filled));
                    }
                    Value::Object(obj)
                }
                other => other,
            })
            .collect(),
    )
}

/// JSON strings are equal when they decode to the same document; an empty
/// string stands for `{}`.
fn same_json(a: &Value, b: &Value) -> bool {
    let decode = |v: &Value| -> Option<Value> {
        match v.as_str().unwrap_or_default() {
            "" => Some(Value::Object(Map::new())),
            raw => serde_json::from_str(raw).ok(),
        }
    };
    match (decode(a), decode(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

async fn create(
    resource: &dyn Resource,
    client: &BastionClient,
    type_name: &str,
    config: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut d = ResourceData::from_config(resource.schema(), config.clone());
    info!(resource = type_name, "creating");
    resource.create(client, &mut d).await?;
    read_back(resource, client, type_name, d).await
}

async fn read_back(
    resource: &dyn Resource,
    client: &BastionClient,
    type_name: &str,
    mut d: ResourceData,
) -> Result<Map<String, Value>> {
    let id = d.id().to_string();
    resource.read(client, &mut d).await?;
    if d.id().is_empty() {
        return Err(BastionError::validation(format!(
            "{type_name} with ID {id} not found when reading it back"
        )));
    }
    Ok(d.into_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_json_ignores_formatting() {
        assert!(same_json(&json!(r#"{"a": 1, "b": [1,2]}"#), &json!(r#"{"b":[1,2],"a":1}"#)));
        assert!(same_json(&json!(""), &json!("{}")));
        assert!(!same_json(&json!(r#"{"a":1}"#), &json!(r#"{"a":2}"#)));
    }

    #[test]
    fn test_complete_blocks_fills_defaults() {
        use crate::schema::{Attribute, Schema};
        let ty = Attribute::block_set(
            Schema::new()
                .with_attribute("account", Attribute::string().required())
                .with_attribute("device", Attribute::string().optional().default(""))
                .with_attribute("port", Attribute::int().optional()),
        )
        .ty;
        let configured = complete_blocks(&ty, json!([{"account": "admin"}]));
        let read_back = complete_blocks(&ty, json!([{"account": "admin", "device": null, "port": 0}]));
        assert_eq!(configured, read_back);
        assert_eq!(configured, json!([{"account": "admin", "device": "", "port": 0}]));
        assert_eq!(complete_blocks(&AttributeType::String, json!("x")), json!("x"));
    }
}
