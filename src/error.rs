//! # Errors
//!
//! Typed errors raised by the client, the schema layer and the resource
//! adapters. Messages keep the wording operators already grep for in
//! appliance logs and CI output.

use thiserror::Error;

/// Result alias used across the library
pub type Result<T, E = BastionError> = std::result::Result<T, E>;

/// Errors raised while talking to a Bastion appliance
#[derive(Debug, Error)]
pub enum BastionError {
    /// The request never produced a response
    #[error("sending http request: {0}")]
    Transport(#[from] reqwest::Error),

    /// A GET answered with something other than 200
    #[error("api doesn't return OK: {status} with body:\n{body}")]
    NotOk { status: u16, body: String },

    /// A mutation answered with something other than 200 or 204
    #[error("api doesn't return OK or NoContent: {status} with body:\n{body}")]
    NotOkOrNoContent { status: u16, body: String },

    /// Response or payload JSON could not be (de)serialized
    #[error("unmarshaling json: {0}")]
    Json(#[from] serde_json::Error),

    /// The resource or data source is not available with the configured API version
    #[error("{kind} {name} not available with api version {version}{hint}")]
    UnsupportedVersion {
        kind: &'static str,
        name: String,
        version: String,
        hint: String,
    },

    /// Provider configuration is unusable
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Local validation failed before any request was sent
    #[error("{0}")]
    Validation(String),

    /// An object with the same name is already present on the appliance
    #[error("{field} {name} already exists")]
    AlreadyExists { field: &'static str, name: String },

    /// The object could not be found again right after it was created
    #[error("{field} {name} not found after POST")]
    NotFoundAfterPost { field: &'static str, name: String },

    /// A parent object referenced by ID is missing
    #[error("{parent} with ID {id} doesn't exists")]
    ParentNotFound { parent: &'static str, id: String },

    /// A data source lookup matched nothing
    #[error("{field} {name} doesn't exists")]
    DoesNotExist { field: &'static str, name: String },

    /// A data source query returned no result
    #[error("{field} {name} not found")]
    NotFound { field: &'static str, name: String },

    /// An import ID does not have the expected number of parts
    #[error("id must be {expected}")]
    ImportIdFormat { expected: &'static str },

    /// An import ID did not match any object
    #[error("don't find {field} with id {id} (id must be {expected})")]
    ImportNotFound {
        field: &'static str,
        id: String,
        expected: &'static str,
    },

    /// A value could not be written into the state
    #[error("setting {key}: {reason}")]
    StateSet { key: String, reason: String },

    /// No adapter is registered under that name
    #[error("unknown {kind} {name}")]
    UnknownType { kind: &'static str, name: String },
}

impl BastionError {
    /// Shorthand for [`BastionError::Validation`]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for [`BastionError::StateSet`]
    pub fn state_set(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StateSet {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_appliance_wording() {
        let err = BastionError::NotOk {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "api doesn't return OK: 500 with body:\nboom");

        let err = BastionError::AlreadyExists {
            field: "user_name",
            name: "alice".to_string(),
        };
        assert_eq!(err.to_string(), "user_name alice already exists");

        let err = BastionError::ParentNotFound {
            parent: "device",
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "device with ID 42 doesn't exists");
    }

    #[test]
    fn test_unsupported_version_hint() {
        let err = BastionError::UnsupportedVersion {
            kind: "resource",
            name: "wallix-bastion_ldapmapping".to_string(),
            version: "v3.8".to_string(),
            hint: "\n use wallix-bastion_authdomain_mapping instead".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "resource wallix-bastion_ldapmapping not available with api version v3.8\n use wallix-bastion_authdomain_mapping instead"
        );
    }
}
