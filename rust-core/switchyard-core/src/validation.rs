//! # Validation Module
//!
//! Structured validation errors produced by [`crate::contract::Contract`].
//!
//! The dispatcher stores them in the response payload under [`ERRORS_KEY`]
//! as a list of `{fieldName, errorCode}` maps.

use crate::value::Value;
use crate::value_map::ValueMap;
use serde::Serialize;
use std::fmt;

/// Payload key the dispatcher writes validation failures under
pub const ERRORS_KEY: &str = "errors";

/// Error code for categorizing validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationCode {
    /// No error
    #[serde(rename = "OK")]
    Ok,
    /// String length outside the allowed bounds
    InvalidLength,
    /// Value rejected by a pattern or accept-list
    InvalidValue,
    /// Value cannot be coerced to the field type
    InvalidValueType,
    /// Required field is missing
    MissingRequiredField,
    /// Key not declared in the contract
    UnknownField,
    /// Number outside the allowed range
    ValueOutOfRange,
}

impl ValidationCode {
    /// Stable name used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidLength => "InvalidLength",
            Self::InvalidValue => "InvalidValue",
            Self::InvalidValueType => "InvalidValueType",
            Self::MissingRequiredField => "MissingRequiredField",
            Self::UnknownField => "UnknownField",
            Self::ValueOutOfRange => "ValueOutOfRange",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation error for a specific field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the contract or payload
    #[serde(rename = "fieldName")]
    pub field: String,
    /// Machine-readable error code
    #[serde(rename = "errorCode")]
    pub code: ValidationCode,
    /// Human-readable error message
    #[serde(skip)]
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: ValidationCode) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }

    /// Create a "missing required field" error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "missing required field", ValidationCode::MissingRequiredField)
    }

    /// Create an "unknown field" error
    pub fn unknown(field: impl Into<String>) -> Self {
        Self::new(field, "unknown field", ValidationCode::UnknownField)
    }

    /// Create an "invalid type" error
    pub fn invalid_type(field: impl Into<String>, expected: &str) -> Self {
        let field_str = field.into();
        Self {
            message: format!("{field_str} must be {expected}"),
            field: field_str,
            code: ValidationCode::InvalidValueType,
        }
    }

    /// Render as a `{fieldName, errorCode}` map
    #[must_use]
    pub fn to_value_map(&self) -> ValueMap {
        let mut map = ValueMap::new();
        map.set("fieldName", self.field.as_str())
            .set("errorCode", self.code.as_str());
        map
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.code, self.message)
    }
}

/// Collection of validation errors
///
/// Allows aggregating multiple field errors for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    /// List of field-level errors
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty error collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field error
    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Check if there are any errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Code reported for a field, if any
    #[must_use]
    pub fn code_for(&self, field: &str) -> Option<ValidationCode> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.code)
    }

    /// Convert to JSON response body
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"errors":[]}"#.to_string())
    }

    /// List value stored under [`ERRORS_KEY`] in a response payload
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::List(
            self.errors
                .iter()
                .map(|e| Value::from(e.to_value_map()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
