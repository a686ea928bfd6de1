//! # Contracts
//!
//! Declarative payload schemas: a [`Contract`] is a set of named, typed
//! fields, each optionally required and carrying zero or more constraints.
//!
//! ```ignore
//! let contract = Contract::new()
//!     .with(StringField::new("name").length(3, 32).required())
//!     .with(IntegerField::new("age").range(0, 150));
//!
//! let errors = contract.validate(&payload);
//! ```
//!
//! Validation never short-circuits across fields: every schema field and
//! every payload key is examined. Within one field the first failing
//! constraint wins.

use crate::error::{Error, Result};
use crate::validation::{FieldError, ValidationCode, ValidationErrors};
use crate::value::Value;
use crate::value_map::ValueMap;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone)]
enum StringRule {
    Length { min: i64, max: i64 },
    Pattern(Regex),
    Accept(Vec<String>),
}

impl StringRule {
    fn check(&self, value: &str) -> Option<(ValidationCode, String)> {
        match self {
            Self::Length { min, max } => {
                let length = i64::try_from(value.chars().count()).unwrap_or(i64::MAX);
                if *min > 0 && length < *min {
                    return Some((
                        ValidationCode::InvalidLength,
                        format!("length must be greater or equal to {min}"),
                    ));
                }
                if *max > 0 && length > *max {
                    return Some((
                        ValidationCode::InvalidLength,
                        format!("length must be less or equal to {max}"),
                    ));
                }
                None
            }
            Self::Pattern(regex) => (!regex.is_match(value)).then(|| {
                (
                    ValidationCode::InvalidValue,
                    "value does not match pattern".to_string(),
                )
            }),
            Self::Accept(accepted) => (!accepted.iter().any(|a| a == value)).then(|| {
                (
                    ValidationCode::InvalidValue,
                    "value does not match accepted values".to_string(),
                )
            }),
        }
    }
}

/// String field with length, pattern and accept-list constraints
#[derive(Debug, Clone)]
pub struct StringField {
    name: String,
    required: bool,
    rules: Vec<StringRule>,
}

impl StringField {
    /// Optional string field with no constraints
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            required: false,
            rules: Vec::new(),
        }
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Bound the length in characters; zero or negative means unbounded
    #[must_use]
    pub fn length(mut self, min: i64, max: i64) -> Self {
        self.rules.push(StringRule::Length { min, max });
        self
    }

    /// Require the value to match a regular expression
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if `pattern` does not compile
    pub fn regex(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            field: self.name.clone(),
            source,
        })?;
        self.rules.push(StringRule::Pattern(regex));
        Ok(self)
    }

    /// Restrict the value to a fixed set
    #[must_use]
    pub fn accept<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .push(StringRule::Accept(values.into_iter().map(Into::into).collect()));
        self
    }

    fn validate(&self, value: &Value) -> Option<FieldError> {
        let Some(text) = value.to_str_value() else {
            return Some(FieldError::invalid_type(&self.name, "a string"));
        };
        self.rules
            .iter()
            .find_map(|rule| rule.check(&text))
            .map(|(code, message)| FieldError::new(&self.name, message, code))
    }
}

/// Integer field with an inclusive range
#[derive(Debug, Clone)]
pub struct IntegerField {
    name: String,
    required: bool,
    min: i64,
    max: i64,
}

impl IntegerField {
    /// Optional integer field accepting the whole `i64` domain
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            required: false,
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the lower bound
    #[must_use]
    pub fn min(mut self, min: i64) -> Self {
        self.min = min;
        self
    }

    /// Set the upper bound
    #[must_use]
    pub fn max(mut self, max: i64) -> Self {
        self.max = max;
        self
    }

    /// Set both bounds
    #[must_use]
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    fn validate(&self, value: &Value) -> Option<FieldError> {
        let Some(number) = value.to_int() else {
            return Some(FieldError::invalid_type(&self.name, "an integer"));
        };
        (!(self.min..=self.max).contains(&number)).then(|| {
            FieldError::new(
                &self.name,
                format!("value must be between {} and {}", self.min, self.max),
                ValidationCode::ValueOutOfRange,
            )
        })
    }
}

/// Float field with an inclusive range
///
/// NaN is never inside a range.
#[derive(Debug, Clone)]
pub struct FloatField {
    name: String,
    required: bool,
    min: f64,
    max: f64,
}

impl FloatField {
    /// Optional float field accepting every finite `f64`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            required: false,
            min: f64::MIN,
            max: f64::MAX,
        }
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the lower bound
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    /// Set the upper bound
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = max;
        self
    }

    /// Set both bounds
    #[must_use]
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    fn validate(&self, value: &Value) -> Option<FieldError> {
        let Some(number) = value.to_float() else {
            return Some(FieldError::invalid_type(&self.name, "a float"));
        };
        (!(self.min..=self.max).contains(&number)).then(|| {
            FieldError::new(
                &self.name,
                format!("value must be between {} and {}", self.min, self.max),
                ValidationCode::ValueOutOfRange,
            )
        })
    }
}

/// Any contract field
#[derive(Debug, Clone)]
pub enum Field {
    /// String field
    String(StringField),
    /// Integer field
    Integer(IntegerField),
    /// Float field
    Float(FloatField),
}

impl Field {
    /// Lowercased field name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::String(f) => &f.name,
            Self::Integer(f) => &f.name,
            Self::Float(f) => &f.name,
        }
    }

    /// Whether the field must be present
    #[must_use]
    pub fn is_required(&self) -> bool {
        match self {
            Self::String(f) => f.required,
            Self::Integer(f) => f.required,
            Self::Float(f) => f.required,
        }
    }

    /// Check one present value against this field
    #[must_use]
    pub fn validate(&self, value: &Value) -> Option<FieldError> {
        match self {
            Self::String(f) => f.validate(value),
            Self::Integer(f) => f.validate(value),
            Self::Float(f) => f.validate(value),
        }
    }
}

impl From<StringField> for Field {
    fn from(field: StringField) -> Self {
        Self::String(field)
    }
}

impl From<IntegerField> for Field {
    fn from(field: IntegerField) -> Self {
        Self::Integer(field)
    }
}

impl From<FloatField> for Field {
    fn from(field: FloatField) -> Self {
        Self::Float(field)
    }
}

/// Payload schema
///
/// Field names are unique; adding a field whose name already exists
/// replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    fields: BTreeMap<String, Field>,
}

impl Contract {
    /// Create an empty contract
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Contract::add`]
    #[must_use]
    pub fn with(mut self, field: impl Into<Field>) -> Self {
        self.add(field);
        self
    }

    /// Add a field, replacing any field with the same name
    pub fn add(&mut self, field: impl Into<Field>) {
        let field = field.into();
        let name = field.name().to_string();
        if self.fields.insert(name.clone(), field).is_some() {
            warn!(field = %name, "Contract field redefined, keeping the last definition");
        }
    }

    /// Look up a field by name (case-insensitive)
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(&name.to_lowercase())
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the contract declares no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a payload
    ///
    /// Schema-field errors come first in field-name order, followed by one
    /// `UnknownField` per undeclared payload key in key order. Payload keys
    /// are matched case-insensitively.
    #[must_use]
    pub fn validate(&self, payload: &ValueMap) -> ValidationErrors {
        let lowered = payload.lowercase_keys();
        let mut errors = ValidationErrors::new();

        for (name, field) in &self.fields {
            match lowered.get(name) {
                None if field.is_required() => errors.add(FieldError::missing(name)),
                None => {}
                Some(value) => {
                    if let Some(error) = field.validate(value) {
                        errors.add(error);
                    }
                }
            }
        }

        for key in payload.keys() {
            if !self.fields.contains_key(&key.to_lowercase()) {
                errors.add(FieldError::unknown(key));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload<const N: usize>(entries: [(&str, Value); N]) -> ValueMap {
        entries.into_iter().collect()
    }

    #[test]
    fn test_short_string_is_invalid_length() {
        let contract = Contract::new().with(StringField::new("name").required().length(3, 32));
        let errors = contract.validate(&payload([("name", Value::from("ab"))]));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.code_for("name"), Some(ValidationCode::InvalidLength));
    }

    #[test]
    fn test_missing_required_field() {
        let contract = Contract::new().with(StringField::new("id").required());
        let errors = contract.validate(&ValueMap::new());

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.code_for("id"), Some(ValidationCode::MissingRequiredField));
    }

    #[test]
    fn test_missing_optional_field_is_fine() {
        let contract = Contract::new().with(StringField::new("nickname"));
        assert!(contract.validate(&ValueMap::new()).is_empty());
    }

    #[test]
    fn test_unknown_field_reported_alone() {
        let contract = Contract::new().with(StringField::new("name"));
        let errors = contract.validate(&payload([
            ("name", Value::from("ok")),
            ("extra", Value::Int(1)),
        ]));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.code_for("extra"), Some(ValidationCode::UnknownField));
        assert_eq!(errors.code_for("name"), None);
    }

    #[test]
    fn test_every_field_and_key_is_reported() {
        let contract = Contract::new()
            .with(StringField::new("username").required())
            .with(StringField::new("password").required().length(8, 128))
            .with(IntegerField::new("age").range(0, 150));
        let errors = contract.validate(&payload([
            ("password", Value::from("short")),
            ("age", Value::Int(200)),
            ("role", Value::from("admin")),
        ]));

        let fields: Vec<&str> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["age", "password", "username", "role"]);
        assert_eq!(errors.code_for("age"), Some(ValidationCode::ValueOutOfRange));
        assert_eq!(errors.code_for("password"), Some(ValidationCode::InvalidLength));
        assert_eq!(errors.code_for("username"), Some(ValidationCode::MissingRequiredField));
        assert_eq!(errors.code_for("role"), Some(ValidationCode::UnknownField));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let contract = Contract::new().with(
            StringField::new("color")
                .accept(["red", "green"])
                .length(10, 0),
        );
        let errors = contract.validate(&payload([("color", Value::from("blue"))]));
        assert_eq!(errors.code_for("color"), Some(ValidationCode::InvalidValue));

        let contract = Contract::new().with(
            StringField::new("color")
                .length(10, 0)
                .accept(["red", "green"]),
        );
        let errors = contract.validate(&payload([("color", Value::from("blue"))]));
        assert_eq!(errors.code_for("color"), Some(ValidationCode::InvalidLength));
    }

    #[test]
    fn test_length_counts_characters() {
        let contract = Contract::new().with(StringField::new("city").length(1, 6));
        let errors = contract.validate(&payload([("city", Value::from("Zürich"))]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unbounded_length_sides() {
        let contract = Contract::new().with(StringField::new("bio").length(0, 3));
        assert!(contract.validate(&payload([("bio", Value::from(""))])).is_empty());

        let contract = Contract::new().with(StringField::new("bio").length(2, -1));
        let long = "x".repeat(10_000);
        assert!(contract.validate(&payload([("bio", Value::from(long))])).is_empty());
    }

    #[test]
    fn test_regex_rule() {
        let contract = Contract::new().with(
            StringField::new("id")
                .regex("^[0-9a-f]{8}$")
                .unwrap()
                .required(),
        );
        assert!(contract.validate(&payload([("id", Value::from("deadbeef"))])).is_empty());
        let errors = contract.validate(&payload([("id", Value::from("nope"))]));
        assert_eq!(errors.code_for("id"), Some(ValidationCode::InvalidValue));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let result = StringField::new("id").regex("(unclosed");
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_uncoercible_types() {
        let contract = Contract::new()
            .with(StringField::new("name"))
            .with(IntegerField::new("count"))
            .with(FloatField::new("ratio"));
        let errors = contract.validate(&payload([
            ("name", Value::from(vec!["a", "b"])),
            ("count", Value::from("many")),
            ("ratio", Value::Null),
        ]));

        assert_eq!(errors.len(), 3);
        for field in ["name", "count", "ratio"] {
            assert_eq!(errors.code_for(field), Some(ValidationCode::InvalidValueType));
        }
    }

    #[test]
    fn test_numeric_strings_coerce() {
        let contract = Contract::new()
            .with(IntegerField::new("page").min(1))
            .with(FloatField::new("scale").range(0.0, 1.0));
        let ok = payload([("page", Value::from("3")), ("scale", Value::from("0.5"))]);
        assert!(contract.validate(&ok).is_empty());

        let bad = payload([("page", Value::Int(0)), ("scale", Value::Float(1.5))]);
        let errors = contract.validate(&bad);
        assert_eq!(errors.code_for("page"), Some(ValidationCode::ValueOutOfRange));
        assert_eq!(errors.code_for("scale"), Some(ValidationCode::ValueOutOfRange));
    }

    #[test]
    fn test_float_default_range_accepts_zero_and_negatives() {
        let contract = Contract::new().with(FloatField::new("delta"));
        assert!(contract.validate(&payload([("delta", Value::Float(0.0))])).is_empty());
        assert!(contract.validate(&payload([("delta", Value::Float(-4.5))])).is_empty());
        let errors = contract.validate(&payload([("delta", Value::Float(f64::NAN))]));
        assert_eq!(errors.code_for("delta"), Some(ValidationCode::ValueOutOfRange));
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        let contract = Contract::new().with(StringField::new("UserName").required());
        assert!(contract.field("username").is_some());
        assert!(contract.validate(&payload([("USERNAME", Value::from("bob"))])).is_empty());
    }

    #[test]
    fn test_redefined_field_keeps_last() {
        let contract = Contract::new()
            .with(StringField::new("code").required())
            .with(IntegerField::new("code"));
        assert_eq!(contract.len(), 1);
        assert!(matches!(contract.field("code"), Some(Field::Integer(_))));
        assert!(contract.validate(&ValueMap::new()).is_empty());
    }
}
