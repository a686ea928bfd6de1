//! # JSON Serialization Module
//!
//! JSON parsing using simd-json, serialization using serde_json.
//!
//! Request bodies are parsed in place into a [`ValueMap`]; response payloads
//! are written back with serde_json.

use crate::error::{Error, Result};
use crate::value::Value;
use crate::value_map::ValueMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse JSON bytes to a typed value using simd-json
///
/// simd-json parses in place, so the buffer is clobbered.
///
/// # Errors
///
/// Returns `Error::SimdJson` if parsing fails
pub fn parse_json_bytes<T: DeserializeOwned>(bytes: &mut [u8]) -> Result<T> {
    Ok(simd_json::from_slice(bytes)?)
}

/// Parse a JSON object into a [`ValueMap`]
///
/// Nested objects become nested maps, arrays become lists. A blank buffer
/// yields an empty map.
///
/// # Errors
///
/// Returns `Error::SimdJson` on malformed input and `Error::BadRequest` when
/// the document is not an object
pub fn parse_object(bytes: &mut [u8]) -> Result<ValueMap> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ValueMap::new());
    }

    match parse_json_bytes::<serde_json::Value>(bytes)? {
        serde_json::Value::Object(object) => Ok(object
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect()),
        other => Err(Error::BadRequest {
            message: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Serialize a value to JSON string
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
