//! State handle passed to adapters.
//!
//! `ResourceData` holds the desired values of one object (configuration
//! merged with what the appliance reported) plus, during updates, the prior
//! state so adapters can ask what changed.

use super::{AttributeType, Element, Schema};
use crate::error::{BastionError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct ResourceData {
    id: String,
    schema: Schema,
    values: Map<String, Value>,
    prior: Option<Map<String, Value>>,
}

impl ResourceData {
    /// Data for a create or a data-source read: configuration only
    pub fn from_config(schema: Schema, config: Map<String, Value>) -> Self {
        Self {
            id: String::new(),
            schema,
            values: strip_nulls(config),
            prior: None,
        }
    }

    /// Data for an existing object, as loaded from state
    pub fn from_state(schema: Schema, mut state: Map<String, Value>) -> Self {
        let id = match state.remove("id") {
            Some(Value::String(id)) => id,
            _ => String::new(),
        };
        Self {
            id,
            schema,
            values: strip_nulls(state),
            prior: None,
        }
    }

    /// Data for an in-place update.
    ///
    /// Configured values win; computed attributes the configuration leaves
    /// out are carried over from the prior state.
    pub fn for_update(schema: Schema, prior_state: Map<String, Value>, config: Map<String, Value>) -> Self {
        let mut data = Self::from_state(schema, prior_state);
        let prior = data.values.clone();
        let mut values = strip_nulls(config);
        for (name, attr) in data.schema.attributes() {
            if attr.computed && !values.contains_key(name) {
                if let Some(v) = prior.get(name) {
                    values.insert(name.to_string(), v.clone());
                }
            }
        }
        data.values = values;
        data.prior = Some(prior);
        data
    }

    /// Data for an import: only the user supplied import ID is known
    pub fn for_import(schema: Schema, import_id: &str) -> Self {
        Self {
            id: import_id.to_string(),
            schema,
            values: Map::new(),
            prior: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Value of `key`, falling back to the schema default then the zero value
    pub fn get(&self, key: &str) -> Value {
        if let Some(v) = self.values.get(key) {
            return v.clone();
        }
        self.schema
            .get(key)
            .map_or(Value::Null, super::Attribute::default_or_zero)
    }

    /// Value of `key` when it is set to something other than its zero value
    pub fn get_ok(&self, key: &str) -> Option<Value> {
        let value = self.get(key);
        let zero = self.schema.get(key).map(|a| a.ty.zero());
        if value.is_null() || Some(&value) == zero.as_ref() {
            None
        } else {
            Some(value)
        }
    }

    pub fn get_string(&self, key: &str) -> String {
        match self.get(key) {
            Value::String(s) => s,
            _ => String::new(),
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).as_bool().unwrap_or_default()
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).as_i64().unwrap_or_default()
    }

    pub fn get_float(&self, key: &str) -> f64 {
        self.get(key).as_f64().unwrap_or_default()
    }

    /// Strings of a list or set attribute. Sets come back sorted.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        let mut out: Vec<String> = match self.get(key) {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        if matches!(self.schema.get(key).map(|a| &a.ty), Some(AttributeType::Set(_))) {
            out.sort();
        }
        out
    }

    /// Decode the blocks of a nested list or set attribute
    ///
    /// # Errors
    /// When a block does not decode into `T`.
    pub fn get_blocks<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.get(key) {
            Value::Array(items) => items
                .into_iter()
                .map(|v| serde_json::from_value(v).map_err(|e| BastionError::state_set(key, e.to_string())))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// Whether `key` differs from the prior state (or from its zero value on create)
    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        !self.same_value(key, &old, &new)
    }

    /// Prior and desired values of `key`
    pub fn get_change(&self, key: &str) -> (Value, Value) {
        let zero = self.schema.get(key).map_or(Value::Null, |a| a.ty.zero());
        let old = self
            .prior
            .as_ref()
            .and_then(|p| p.get(key).cloned())
            .unwrap_or_else(|| zero.clone());
        let new = self.values.get(key).cloned().unwrap_or(zero);
        (old, new)
    }

    fn same_value(&self, key: &str, a: &Value, b: &Value) -> bool {
        match self.schema.get(key).map(|a| &a.ty) {
            Some(AttributeType::Set(_)) => normalize_set(a) == normalize_set(b),
            _ => a == b,
        }
    }

    /// Write `value` into `key` after checking it against the schema
    ///
    /// # Errors
    /// [`BastionError::StateSet`] when the key is unknown or the value has the
    /// wrong type.
    pub fn set(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        let attr = self
            .schema
            .get(key)
            .ok_or_else(|| BastionError::state_set(key, "attribute is not in the schema"))?;
        let value = serde_json::to_value(value).map_err(|e| BastionError::state_set(key, e.to_string()))?;
        if !conforms(&attr.ty, &value) {
            return Err(BastionError::state_set(
                key,
                format!("expected {}, got {value}", attr.ty.describe()),
            ));
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Persisted state: every attribute plus `id`
    pub fn into_state(self) -> Map<String, Value> {
        let mut state = Map::new();
        state.insert("id".to_string(), Value::String(self.id.clone()));
        for (name, attr) in self.schema.attributes() {
            let value = self
                .values
                .get(name)
                .cloned()
                .unwrap_or_else(|| attr.default_or_zero());
            state.insert(name.to_string(), value);
        }
        state
    }
}

fn strip_nulls(mut map: Map<String, Value>) -> Map<String, Value> {
    map.retain(|_, v| !v.is_null());
    map
}

/// Order-insensitive form of a set value
pub(crate) fn normalize_set(value: &Value) -> Vec<String> {
    let mut items: Vec<String> = value
        .as_array()
        .map(|a| a.iter().map(Value::to_string).collect())
        .unwrap_or_default();
    items.sort();
    items
}

fn conforms(ty: &AttributeType, value: &Value) -> bool {
    match (ty, value) {
        (_, Value::Null)
        | (AttributeType::String, Value::String(_))
        | (AttributeType::Bool, Value::Bool(_))
        | (AttributeType::Float, Value::Number(_)) => true,
        (AttributeType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (AttributeType::List(elem) | AttributeType::Set(elem), Value::Array(items)) => {
            items.iter().all(|item| match (elem, item) {
                (Element::String, Value::String(_)) => true,
                (Element::Int, Value::Number(n)) => n.is_i64(),
                (Element::Block(nested), Value::Object(obj)) => obj.iter().all(|(k, v)| {
                    nested.get(k).is_some_and(|a| conforms(&a.ty, v))
                }),
                _ => false,
            })
        }
        _ => false,
    }
}
