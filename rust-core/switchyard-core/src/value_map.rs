//! # Value Map
//!
//! String-keyed container of [`Value`]s used for configuration, request
//! payloads and response payloads.
//!
//! Every typed accessor takes a default and never fails: an absent key or a
//! value that does not coerce yields the default. Keys are stored exactly as
//! given; callers that want case-insensitive behavior lowercase before
//! storing and looking up (see [`crate::config::Config`] and
//! [`crate::contract::Contract`]).

use crate::value::Value;
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

/// Dynamically typed string-keyed map
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueMap {
    entries: BTreeMap<String, Value>,
}

impl ValueMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any existing entry
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Remove an entry
    pub fn unset(&mut self, key: &str) -> &mut Self {
        self.entries.remove(key);
        self
    }

    /// Check whether an entry exists
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Borrow a raw value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a raw value, or `default` when absent
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.entries.get(key).cloned().unwrap_or(default)
    }

    /// Get a value as a string
    #[must_use]
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .and_then(Value::to_str_value)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a value as an i64
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.entries.get(key).and_then(Value::to_int).unwrap_or(default)
    }

    /// Get a value as an f64
    #[must_use]
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.entries
            .get(key)
            .and_then(Value::to_float)
            .unwrap_or(default)
    }

    /// Get a value as a bool
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.entries
            .get(key)
            .and_then(Value::to_bool)
            .unwrap_or(default)
    }

    /// Copy every top-level entry of `other` into this map (right wins)
    ///
    /// Nested maps are shared, not deep-cloned.
    pub fn merge_with(&mut self, other: &Self) -> &mut Self {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    /// True when every entry of `other` exists here with an equal value
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        other
            .entries
            .iter()
            .all(|(key, value)| self.entries.get(key) == Some(value))
    }

    /// Flatten nested maps into `parent<separator>child` keys
    ///
    /// Non-map values are kept as-is; a flat map flattens to itself.
    #[must_use]
    pub fn flatten(&self, separator: &str) -> Self {
        let mut flat = Self::new();
        flatten_into(&mut flat, "", separator, self);
        flat
    }

    /// Copy of this map with every key lowercased
    ///
    /// Keys colliding after lowercasing keep the last one in key order.
    #[must_use]
    pub fn lowercase_keys(&self) -> Self {
        let mut lowered = Self::new();
        for (key, value) in &self.entries {
            lowered.entries.insert(key.to_lowercase(), value.clone());
        }
        lowered
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Iterate keys in order
    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.entries.keys()
    }
}

fn flatten_into(flat: &mut ValueMap, prefix: &str, separator: &str, values: &ValueMap) {
    for (key, value) in &values.entries {
        let path = format!("{prefix}{key}");
        match value {
            Value::Map(nested) => {
                flatten_into(flat, &format!("{path}{separator}"), separator, nested);
            }
            other => {
                flat.entries.insert(path, other.clone());
            }
        }
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}
