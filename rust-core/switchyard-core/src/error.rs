//! # Error Handling
//!
//! Centralized error types for Switchyard core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Routing misses, authentication misses and contract failures are not errors:
//! they are response statuses set by the dispatcher. Handler failures travel
//! as [`HandlerError`] and are never inspected by the framework.

use thiserror::Error;

/// Result type alias for Switchyard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Opaque error returned by request handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by request handlers
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Core error types for the Switchyard runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Listen address could not be parsed
    #[error("Invalid listen address: {address}")]
    InvalidAddress {
        /// The configured address
        address: String,
    },

    /// Invalid regular expression supplied to a contract field
    #[error("Invalid pattern for field {field}: {source}")]
    InvalidPattern {
        /// Field the pattern belongs to
        field: String,
        /// The regex compilation error
        #[source]
        source: regex::Error,
    },

    /// Configuration provider failure
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Request payload was rejected before dispatch
    #[error("Bad request: {message}")]
    BadRequest {
        /// What went wrong
        message: String,
    },

    /// Push/update request carried a non-JSON content type
    #[error("Unsupported content-type: \"{content_type}\"")]
    UnsupportedContentType {
        /// The content type received
        content_type: String,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error from the SIMD parser
    #[error("JSON parse error: {0}")]
    SimdJson(#[from] simd_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },

    /// Request body crossed the limit while being read
    #[error("Payload too large: limit={limit} bytes")]
    BodyLimitExceeded {
        /// Max allowed size
        limit: usize,
    },
}
