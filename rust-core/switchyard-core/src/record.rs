//! # Record Projection
//!
//! Bidirectional mapping between a [`ValueMap`] and a plain Rust struct.
//!
//! A type opts in by implementing [`Record`] and listing its fields as
//! [`RecordField`] descriptors: the map key plus a getter/setter pair for one
//! of the four scalar kinds.
//!
//! ```ignore
//! impl Record for Note {
//!     fn fields() -> Vec<RecordField<Self>> {
//!         vec![
//!             RecordField::<Self>::string("id", |n| n.id.clone(), |n, v| n.id = v),
//!             RecordField::<Self>::string("name", |n| n.name.clone(), |n, v| n.name = v),
//!         ]
//!     }
//! }
//! ```

use crate::value::Value;
use crate::value_map::ValueMap;

/// Getter/setter pair for one scalar kind
pub enum Accessor<T> {
    /// String field
    String(fn(&T) -> String, fn(&mut T, String)),
    /// Boolean field
    Bool(fn(&T) -> bool, fn(&mut T, bool)),
    /// Integer field
    Int(fn(&T) -> i64, fn(&mut T, i64)),
    /// Float field
    Float(fn(&T) -> f64, fn(&mut T, f64)),
}

/// One projected field: map key plus accessor
pub struct RecordField<T> {
    /// Key used in the map
    pub key: &'static str,
    /// How to read and write the struct field
    pub accessor: Accessor<T>,
}

impl<T> RecordField<T> {
    /// Describe a string field
    pub fn string(key: &'static str, get: fn(&T) -> String, set: fn(&mut T, String)) -> Self {
        Self {
            key,
            accessor: Accessor::String(get, set),
        }
    }

    /// Describe a boolean field
    pub fn bool(key: &'static str, get: fn(&T) -> bool, set: fn(&mut T, bool)) -> Self {
        Self {
            key,
            accessor: Accessor::Bool(get, set),
        }
    }

    /// Describe an integer field
    pub fn int(key: &'static str, get: fn(&T) -> i64, set: fn(&mut T, i64)) -> Self {
        Self {
            key,
            accessor: Accessor::Int(get, set),
        }
    }

    /// Describe a float field
    pub fn float(key: &'static str, get: fn(&T) -> f64, set: fn(&mut T, f64)) -> Self {
        Self {
            key,
            accessor: Accessor::Float(get, set),
        }
    }
}

/// A struct that can be projected to and from a [`ValueMap`]
pub trait Record: Sized {
    /// Field descriptors, in projection order
    fn fields() -> Vec<RecordField<Self>>;
}

impl ValueMap {
    /// Set one entry per record field
    pub fn from_record<T: Record>(&mut self, record: &T) -> &mut Self {
        for field in T::fields() {
            let value = match field.accessor {
                Accessor::String(get, _) => Value::String(get(record)),
                Accessor::Bool(get, _) => Value::Bool(get(record)),
                Accessor::Int(get, _) => Value::Int(get(record)),
                Accessor::Float(get, _) => Value::Float(get(record)),
            };
            self.set(field.key, value);
        }
        self
    }

    /// Write entries back into a record
    ///
    /// Fields whose key is absent, or whose value does not coerce, keep their
    /// current value.
    pub fn to_record<T: Record>(&self, record: &mut T) -> &Self {
        for field in T::fields() {
            let Some(value) = self.get(field.key) else {
                continue;
            };
            match field.accessor {
                Accessor::String(_, set) => {
                    if let Some(s) = value.to_str_value() {
                        set(record, s);
                    }
                }
                Accessor::Bool(_, set) => {
                    if let Some(b) = value.to_bool() {
                        set(record, b);
                    }
                }
                Accessor::Int(_, set) => {
                    if let Some(i) = value.to_int() {
                        set(record, i);
                    }
                }
                Accessor::Float(_, set) => {
                    if let Some(f) = value.to_float() {
                        set(record, f);
                    }
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Listener {
        address: String,
        keep_alive: bool,
        backlog: i64,
        timeout: f64,
    }

    impl Record for Listener {
        fn fields() -> Vec<RecordField<Self>> {
            vec![
                RecordField::<Self>::string(
                    "address",
                    |l| l.address.clone(),
                    |l, v| l.address = v,
                ),
                RecordField::<Self>::bool(
                    "keepAlive",
                    |l| l.keep_alive,
                    |l, v| l.keep_alive = v,
                ),
                RecordField::<Self>::int("backlog", |l| l.backlog, |l, v| l.backlog = v),
                RecordField::<Self>::float("timeout", |l| l.timeout, |l, v| l.timeout = v),
            ]
        }
    }

    #[test]
    fn test_from_record() {
        let listener = Listener {
            address: ":80".to_string(),
            keep_alive: true,
            backlog: 128,
            timeout: 2.5,
        };
        let mut map = ValueMap::new();
        map.from_record(&listener);

        assert_eq!(map.len(), 4);
        assert_eq!(map.get("address"), Some(&Value::from(":80")));
        assert_eq!(map.get("keepAlive"), Some(&Value::Bool(true)));
        assert_eq!(map.get("backlog"), Some(&Value::Int(128)));
        assert_eq!(map.get("timeout"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_to_record_coerces_and_skips_absent() {
        let mut listener = Listener {
            address: "keep-me".to_string(),
            ..Listener::default()
        };
        let mut map = ValueMap::new();
        map.set("keepAlive", "yes").set("backlog", "64").set("timeout", 3i64);
        map.to_record(&mut listener);

        assert_eq!(listener.address, "keep-me");
        assert!(listener.keep_alive);
        assert_eq!(listener.backlog, 64);
        assert!((listener.timeout - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_record_leaves_field_on_failed_coercion() {
        let mut listener = Listener {
            backlog: 16,
            ..Listener::default()
        };
        let mut map = ValueMap::new();
        map.set("backlog", "lots");
        map.to_record(&mut listener);
        assert_eq!(listener.backlog, 16);
    }

    #[test]
    fn test_round_trip_through_map() {
        let original = Listener {
            address: "0.0.0.0:9000".to_string(),
            keep_alive: false,
            backlog: 5,
            timeout: 0.25,
        };
        let mut map = ValueMap::new();
        map.from_record(&original);
        let mut copy = Listener::default();
        map.to_record(&mut copy);
        assert_eq!(copy, original);
    }
}
