//! Configuration validation and diagnostics.

use super::{Attribute, AttributeType, Element, Schema, Validator};
use crate::error::{BastionError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding, optionally pointing at an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{attr}: {}", self.summary),
            None => f.write_str(&self.summary),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn error(&mut self, attribute: Option<&str>, summary: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            attribute: attribute.map(str::to_string),
        });
    }

    pub fn warning(&mut self, attribute: Option<&str>, summary: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            attribute: attribute.map(str::to_string),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Collapse errors into a single [`BastionError::Validation`]
    ///
    /// # Errors
    /// When at least one error diagnostic is present.
    pub fn into_result(self) -> Result<()> {
        if !self.has_errors() {
            return Ok(());
        }
        let msg = self
            .0
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Err(BastionError::Validation(msg))
    }
}

fn is_set(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

fn path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

pub(super) fn validate_object(schema: &Schema, config: &Map<String, Value>, prefix: &str, diags: &mut Diagnostics) {
    for key in config.keys() {
        if schema.get(key).is_none() {
            diags.error(Some(&path(prefix, key)), "unsupported argument");
        }
    }

    let mut reported_groups: Vec<Vec<&str>> = Vec::new();
    for (name, attr) in schema.attributes() {
        let here = path(prefix, name);
        let value = config.get(name).filter(|v| !v.is_null());

        match value {
            None => {
                if attr.required {
                    diags.error(Some(&here), "required field is not set");
                }
            }
            Some(v) => {
                if !attr.is_configurable() {
                    diags.error(Some(&here), "computed attribute cannot be set");
                    continue;
                }
                validate_value(attr, v, &here, diags);
                for other in &attr.required_with {
                    if !is_set(config.get(*other)) {
                        diags.error(Some(&here), format!("all of `{name},{other}` must be specified"));
                    }
                }
                for other in &attr.conflicts_with {
                    if is_set(config.get(*other)) {
                        diags.error(Some(&here), format!("conflicts with {other}"));
                    }
                }
            }
        }

        if !attr.at_least_one_of.is_empty() {
            let mut group: Vec<&str> = attr.at_least_one_of.clone();
            if !group.contains(&name) {
                group.push(name);
            }
            group.sort_unstable();
            if !reported_groups.contains(&group)
                && !group.iter().any(|k| is_set(config.get(*k)))
            {
                diags.error(
                    Some(prefix).filter(|p| !p.is_empty()),
                    format!("one of `{}` must be specified", group.join(",")),
                );
                reported_groups.push(group);
            }
        }
    }
}

fn validate_value(attr: &Attribute, value: &Value, here: &str, diags: &mut Diagnostics) {
    match &attr.ty {
        AttributeType::String => match value.as_str() {
            Some(_) => run_validators(&attr.validators, value, here, diags),
            None => type_mismatch(attr, here, diags),
        },
        AttributeType::Int => {
            if value.is_i64() {
                run_validators(&attr.validators, value, here, diags);
            } else {
                type_mismatch(attr, here, diags);
            }
        }
        AttributeType::Float => {
            if value.is_number() {
                run_validators(&attr.validators, value, here, diags);
            } else {
                type_mismatch(attr, here, diags);
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                type_mismatch(attr, here, diags);
            }
        }
        AttributeType::List(elem) | AttributeType::Set(elem) => {
            let Some(items) = value.as_array() else {
                type_mismatch(attr, here, diags);
                return;
            };
            if let Some(max) = attr.max_items {
                if items.len() > max {
                    diags.error(Some(here), format!("attribute supports {max} item maximum, config has {} declared", items.len()));
                }
            }
            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{here}.{idx}");
                match elem {
                    Element::String => match item.as_str() {
                        Some(_) => run_validators(&attr.validators, item, &item_path, diags),
                        None => diags.error(Some(&item_path), "expected string"),
                    },
                    Element::Int => {
                        if !item.is_i64() {
                            diags.error(Some(&item_path), "expected int");
                        }
                    }
                    Element::Block(nested) => match item.as_object() {
                        Some(obj) => validate_object(nested, obj, &item_path, diags),
                        None => diags.error(Some(&item_path), "expected block"),
                    },
                }
            }
        }
    }
}

fn type_mismatch(attr: &Attribute, here: &str, diags: &mut Diagnostics) {
    diags.error(Some(here), format!("expected {}", attr.ty.describe()));
}

fn run_validators(validators: &[Validator], value: &Value, here: &str, diags: &mut Diagnostics) {
    for validator in validators {
        if let Err(msg) = check(validator, value) {
            diags.error(Some(here), msg);
        }
    }
}

/// Apply a single validator to a scalar value
pub fn check(validator: &Validator, value: &Value) -> std::result::Result<(), String> {
    match validator {
        Validator::OneOf(allowed) => {
            let s = value.as_str().unwrap_or_default();
            if allowed.contains(&s) {
                Ok(())
            } else {
                Err(format!("expected to be one of {allowed:?}, got {s}"))
            }
        }
        Validator::IntBetween(min, max) => {
            let n = value.as_i64().unwrap_or_default();
            if (*min..=*max).contains(&n) {
                Ok(())
            } else {
                Err(format!("expected to be in the range ({min} - {max}), got {n}"))
            }
        }
        Validator::FloatBetween(min, max) => {
            let n = value.as_f64().unwrap_or_default();
            if n >= *min && n <= *max {
                Ok(())
            } else {
                Err(format!("expected to be in the range ({min} - {max}), got {n}"))
            }
        }
        Validator::IsJson => {
            let s = value.as_str().unwrap_or_default();
            serde_json::from_str::<Value>(s)
                .map(|_| ())
                .map_err(|e| format!("contains an invalid JSON: {e}"))
        }
        Validator::NotEmpty => {
            if value.as_str().is_some_and(|s| !s.is_empty()) {
                Ok(())
            } else {
                Err("must not be empty".to_string())
            }
        }
        Validator::Regex(pattern) => {
            let s = value.as_str().unwrap_or_default();
            let re = regex::Regex::new(pattern).map_err(|e| format!("invalid pattern {pattern}: {e}"))?;
            if re.is_match(s) {
                Ok(())
            } else {
                Err(format!("invalid format: {s} must match {pattern}"))
            }
        }
    }
}
