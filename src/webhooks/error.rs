//! User-facing admission errors.
//!
//! A denied admission request carries a [`ValidationError`] rendered as JSON
//! in the response message, so API clients can branch on the error type
//! without parsing prose.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DUPLICATE_NAME_ERROR: &str = "DuplicateNameError";
pub const UNKNOWN_ERROR: &str = "UnknownError";
pub const IMMUTABLE_FIELD_ERROR: &str = "ImmutableFieldError";
pub const MISSING_REQUIRED_FIELD_ERROR: &str = "MissingRequiredFieldError";
pub const INVALID_FIELD_VALUE_ERROR: &str = "InvalidFieldValueError";
pub const INVALID_PLACEMENT_ERROR: &str = "InvalidPlacementError";

/// Message of every [`UNKNOWN_ERROR`] unless a caller has a better one
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error has occurred";

/// Reason an admission request was denied.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{error_type}: {message}")]
pub struct ValidationError {
    #[serde(rename = "validationErrorType")]
    pub error_type: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.to_string(),
            message: message.into(),
        }
    }

    pub fn duplicate_name(message: impl Into<String>) -> Self {
        Self::new(DUPLICATE_NAME_ERROR, message)
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_ERROR, UNKNOWN_ERROR_MESSAGE)
    }

    pub fn unknown_with_message(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_ERROR, message)
    }

    /// `field` was changed on update.
    pub fn immutable_field(field: &str) -> Self {
        Self::new(IMMUTABLE_FIELD_ERROR, format!("'{}' field is immutable", field))
    }

    /// Short form of [`ValidationError::immutable_field`] used by tasks and bindings.
    pub fn field_is_immutable(field: &str) -> Self {
        Self::new(IMMUTABLE_FIELD_ERROR, format!("{} is immutable", field))
    }

    pub fn missing_required_field(field: &str) -> Self {
        Self::new(
            MISSING_REQUIRED_FIELD_ERROR,
            format!("missing required field '{}'", field),
        )
    }

    pub fn invalid_field_value(message: impl Into<String>) -> Self {
        Self::new(INVALID_FIELD_VALUE_ERROR, message)
    }

    pub fn invalid_placement(message: impl Into<String>) -> Self {
        Self::new(INVALID_PLACEMENT_ERROR, message)
    }

    pub fn is_type(&self, error_type: &str) -> bool {
        self.error_type == error_type
    }

    /// Render as the JSON object placed in a deny message.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"validationErrorType":"{}","message":"{}"}}"#,
                UNKNOWN_ERROR, UNKNOWN_ERROR_MESSAGE
            )
        })
    }

    /// Parse a deny message produced by [`ValidationError::to_json`].
    pub fn from_json(message: &str) -> Option<Self> {
        serde_json::from_str(message).ok()
    }
}
