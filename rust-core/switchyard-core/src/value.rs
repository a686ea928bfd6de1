//! # Dynamic Values
//!
//! Closed set of value kinds stored in a [`ValueMap`] together with the
//! coercion rules used by every typed accessor.
//!
//! ## Coercion rules
//!
//! - string -> int/float: decimal parse, no coercion on failure
//! - string -> bool: case-insensitive `1/on/yes/enable/enabled/true` and
//!   `0/off/no/disable/disabled/false`, nothing else
//! - float -> int: rounded half away from zero; non-finite or out of `i64`
//!   range does not coerce
//! - bool -> number: `true` = 1, `false` = 0
//! - number -> bool: equality to 1 / 1.0
//! - lists, maps and null never coerce to a scalar

use crate::value_map::ValueMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// Nested map
    Map,
    /// Ordered list
    List,
    /// Absent / JSON null
    Null,
}

impl ValueKind {
    /// Get the type name for log messages
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Map => "map",
            Self::List => "list",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A dynamically typed value
///
/// Nested maps are shared behind an [`Arc`], so copying a value (or merging
/// one map into another) never deep-clones a nested map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// String value
    String(String),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Nested map
    Map(Arc<ValueMap>),
    /// List of values
    List(Vec<Value>),
    /// Null / opaque
    Null,
}

impl Value {
    /// Kind of this value
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Map(_) => ValueKind::Map,
            Self::List(_) => ValueKind::List,
            Self::Null => ValueKind::Null,
        }
    }

    /// Coerce to a string
    #[must_use]
    pub fn to_str_value(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Map(_) | Self::List(_) | Self::Null => None,
        }
    }

    /// Coerce to an i64
    #[must_use]
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Self::String(s) => s.parse::<i64>().ok(),
            Self::Int(i) => Some(*i),
            Self::Float(f) => float_to_int(*f),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Map(_) | Self::List(_) | Self::Null => None,
        }
    }

    /// Coerce to an f64
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Self::String(s) => s.parse::<f64>().ok(),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Map(_) | Self::List(_) | Self::Null => None,
        }
    }

    /// Coerce to a bool
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::String(s) => match s.to_lowercase().as_str() {
                "1" | "on" | "yes" | "enable" | "enabled" | "true" => Some(true),
                "0" | "off" | "no" | "disable" | "disabled" | "false" => Some(false),
                _ => None,
            },
            Self::Int(i) => Some(*i == 1),
            Self::Float(f) => Some(*f == 1.0),
            Self::Bool(b) => Some(*b),
            Self::Map(_) | Self::List(_) | Self::Null => None,
        }
    }

    /// Borrow the nested map, if this is one
    #[must_use]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the list, if this is one
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

// `as` saturates, so the range check has to happen first.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_int(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let rounded = f.round();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Self::Map(Arc::new(m))
    }
}

impl From<Arc<ValueMap>> for Value {
    fn from(m: Arc<ValueMap>) -> Self {
        Self::Map(m)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => {
                let mut map = ValueMap::new();
                for (key, value) in fields {
                    map.set(key, Self::from(value));
                }
                Self::from(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_int() {
        assert_eq!(Value::from("42").to_int(), Some(42));
        assert_eq!(Value::from("-7").to_int(), Some(-7));
        assert_eq!(Value::from("4.2").to_int(), None);
        assert_eq!(Value::from("abc").to_int(), None);
    }

    #[test]
    fn test_string_to_float() {
        assert_eq!(Value::from("3.5").to_float(), Some(3.5));
        assert_eq!(Value::from("10").to_float(), Some(10.0));
        assert_eq!(Value::from("x1").to_float(), None);
    }

    #[test]
    fn test_float_to_int_rounds_half_away_from_zero() {
        assert_eq!(Value::Float(2.5).to_int(), Some(3));
        assert_eq!(Value::Float(-2.5).to_int(), Some(-3));
        assert_eq!(Value::Float(2.4).to_int(), Some(2));
        assert_eq!(Value::Float(f64::NAN).to_int(), None);
        assert_eq!(Value::Float(1e300).to_int(), None);
    }

    #[test]
    fn test_bool_coercions() {
        assert_eq!(Value::Bool(true).to_int(), Some(1));
        assert_eq!(Value::Bool(false).to_float(), Some(0.0));
        assert_eq!(Value::Bool(true).to_str_value(), Some("true".to_string()));
        assert_eq!(Value::Int(1).to_bool(), Some(true));
        assert_eq!(Value::Int(2).to_bool(), Some(false));
        assert_eq!(Value::Float(1.0).to_bool(), Some(true));
    }

    #[test]
    fn test_string_to_bool() {
        for truthy in ["1", "on", "YES", "Enable", "enabled", "TRUE"] {
            assert_eq!(Value::from(truthy).to_bool(), Some(true), "{truthy}");
        }
        for falsy in ["0", "Off", "no", "disable", "DISABLED", "false"] {
            assert_eq!(Value::from(falsy).to_bool(), Some(false), "{falsy}");
        }
        assert_eq!(Value::from("maybe").to_bool(), None);
    }

    #[test]
    fn test_float_to_string() {
        assert_eq!(Value::Float(3.25).to_str_value(), Some("3.25".to_string()));
        assert_eq!(Value::Float(1.0).to_str_value(), Some("1".to_string()));
    }

    #[test]
    fn test_containers_do_not_coerce() {
        let list = Value::from(vec![1i64, 2]);
        assert_eq!(list.to_int(), None);
        assert_eq!(list.to_str_value(), None);
        assert_eq!(Value::Null.to_bool(), None);
        assert_eq!(Value::from(ValueMap::new()).to_float(), None);
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": 1.5, "c": [true, null], "d": {"e": "x"}}"#)
                .unwrap();
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.get("b"), Some(&Value::Float(1.5)));
        assert_eq!(map.get("c").and_then(Value::as_list).map(<[Value]>::len), Some(2));
        assert_eq!(map.get("d").and_then(Value::as_map).map(ValueMap::len), Some(1));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Value::Int(1).kind().to_string(), "int");
        assert_eq!(Value::Null.kind(), ValueKind::Null);
    }
}
