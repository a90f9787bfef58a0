//! # Schema
//!
//! Typed attribute declarations for resources and data sources.
//!
//! ```ignore
//! Schema::new()
//!     .with_attribute("user_name", Attribute::string().required().force_new())
//!     .with_attribute("password", Attribute::string().optional().sensitive())
//!     .with_attribute("groups", Attribute::string_set().required())
//! ```
//!
//! A schema validates a configuration object (see [`validation`]) and types
//! the values written through [`ResourceData`].

pub mod resource_data;
pub mod validation;

pub use resource_data::ResourceData;
pub use validation::{Diagnostic, Diagnostics, Severity};

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Element type of a list or set attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    String,
    Int,
    Block(Schema),
}

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
    List(Element),
    /// Unordered collection; compared without regard to order
    Set(Element),
}

impl AttributeType {
    /// Zero value used when an attribute is neither configured nor defaulted
    pub fn zero(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Int => Value::from(0),
            Self::Float => Value::from(0.0),
            Self::Bool => Value::Bool(false),
            Self::List(_) | Self::Set(_) => Value::Array(Vec::new()),
        }
    }

    /// Human readable name used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List(_) => "list",
            Self::Set(_) => "set",
        }
    }
}

/// Value constraint checked during validation
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// String must be one of the listed values
    OneOf(&'static [&'static str]),
    /// Integer within an inclusive range
    IntBetween(i64, i64),
    /// Float within an inclusive range
    FloatBetween(f64, f64),
    /// String must hold valid JSON
    IsJson,
    /// String must not be empty
    NotEmpty,
    /// String must match the regular expression
    Regex(&'static str),
}

/// One attribute of a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub ty: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    pub default: Option<Value>,
    pub validators: Vec<Validator>,
    pub required_with: Vec<&'static str>,
    pub conflicts_with: Vec<&'static str>,
    pub at_least_one_of: Vec<&'static str>,
    pub max_items: Option<usize>,
}

impl Attribute {
    fn of(ty: AttributeType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            validators: Vec::new(),
            required_with: Vec::new(),
            conflicts_with: Vec::new(),
            at_least_one_of: Vec::new(),
            max_items: None,
        }
    }

    pub fn string() -> Self {
        Self::of(AttributeType::String)
    }

    pub fn int() -> Self {
        Self::of(AttributeType::Int)
    }

    pub fn float() -> Self {
        Self::of(AttributeType::Float)
    }

    pub fn bool() -> Self {
        Self::of(AttributeType::Bool)
    }

    pub fn string_list() -> Self {
        Self::of(AttributeType::List(Element::String))
    }

    pub fn string_set() -> Self {
        Self::of(AttributeType::Set(Element::String))
    }

    pub fn int_set() -> Self {
        Self::of(AttributeType::Set(Element::Int))
    }

    pub fn block_list(schema: Schema) -> Self {
        Self::of(AttributeType::List(Element::Block(schema)))
    }

    pub fn block_set(schema: Schema) -> Self {
        Self::of(AttributeType::Set(Element::Block(schema)))
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set by the appliance. Combined with [`Attribute::optional`] the value
    /// may also be configured.
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// A change of this attribute destroys and recreates the object
    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn default(mut self, value: impl Serialize) -> Self {
        self.default = serde_json::to_value(value).ok();
        self.optional = true;
        self
    }

    #[must_use]
    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.validators.push(Validator::OneOf(values));
        self
    }

    #[must_use]
    pub fn int_between(mut self, min: i64, max: i64) -> Self {
        self.validators.push(Validator::IntBetween(min, max));
        self
    }

    #[must_use]
    pub fn float_between(mut self, min: f64, max: f64) -> Self {
        self.validators.push(Validator::FloatBetween(min, max));
        self
    }

    #[must_use]
    pub fn json(mut self) -> Self {
        self.validators.push(Validator::IsJson);
        self
    }

    #[must_use]
    pub fn not_empty(mut self) -> Self {
        self.validators.push(Validator::NotEmpty);
        self
    }

    #[must_use]
    pub fn matches(mut self, pattern: &'static str) -> Self {
        self.validators.push(Validator::Regex(pattern));
        self
    }

    #[must_use]
    pub fn required_with(mut self, keys: &[&'static str]) -> Self {
        self.required_with.extend_from_slice(keys);
        self
    }

    #[must_use]
    pub fn conflicts_with(mut self, keys: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(keys);
        self
    }

    #[must_use]
    pub fn at_least_one_of(mut self, keys: &[&'static str]) -> Self {
        self.at_least_one_of.extend_from_slice(keys);
        self
    }

    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Whether the attribute holds a JSON document compared by value
    pub fn is_json(&self) -> bool {
        self.validators.contains(&Validator::IsJson)
    }

    /// Computed-only attributes cannot appear in a configuration
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }

    /// Value used when the configuration omits the attribute
    pub fn default_or_zero(&self) -> Value {
        self.default.clone().unwrap_or_else(|| self.ty.zero())
    }
}

/// Ordered set of named attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }

    /// Check a configuration object against the schema
    pub fn validate(&self, config: &Map<String, Value>) -> Diagnostics {
        let mut diags = Diagnostics::default();
        validation::validate_object(self, config, "", &mut diags);
        diags
    }

    /// JSON description of the schema, printed by `bastionctl schema`
    pub fn describe(&self) -> Value {
        let mut out = Map::new();
        for (name, attr) in self.attributes() {
            let mut entry = Map::new();
            entry.insert("type".to_string(), Value::from(attr.ty.describe()));
            for (flag, set) in [
                ("required", attr.required),
                ("optional", attr.optional),
                ("computed", attr.computed),
                ("sensitive", attr.sensitive),
                ("force_new", attr.force_new),
            ] {
                if set {
                    entry.insert(flag.to_string(), Value::Bool(true));
                }
            }
            if let Some(default) = &attr.default {
                entry.insert("default".to_string(), default.clone());
            }
            if let AttributeType::List(Element::Block(nested)) | AttributeType::Set(Element::Block(nested)) =
                &attr.ty
            {
                entry.insert("block".to_string(), nested.describe());
            }
            if let Some(max) = attr.max_items {
                entry.insert("max_items".to_string(), Value::from(max));
            }
            out.insert(name.to_string(), Value::Object(entry));
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_flags() {
        let attr = Attribute::string().required().force_new().sensitive();
        assert!(attr.required && attr.force_new && attr.sensitive);
        assert!(attr.is_configurable());
        assert!(!Attribute::string().computed().is_configurable());
    }

    #[test]
    fn test_default_makes_optional() {
        let attr = Attribute::string().default("{}");
        assert!(attr.optional);
        assert_eq!(attr.default_or_zero(), json!("{}"));
        assert_eq!(Attribute::int_set().default_or_zero(), json!([]));
    }

    #[test]
    fn test_describe_nests_blocks() {
        let schema = Schema::new().with_attribute(
            "session",
            Attribute::block_list(
                Schema::new().with_attribute("accounts", Attribute::string_set().optional()),
            )
            .optional()
            .max_items(1),
        );
        let described = schema.describe();
        assert_eq!(described["session"]["type"], "list");
        assert_eq!(described["session"]["max_items"], 1);
        assert_eq!(described["session"]["block"]["accounts"]["type"], "set");
    }
}
