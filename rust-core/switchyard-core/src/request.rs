//! # Requests and Responses
//!
//! Transport-neutral request/response model consumed by the dispatcher.
//!
//! Every [`Request`] gets a random hex id at construction; the matching
//! [`Response`] copies it so log lines can be correlated.

use crate::value_map::ValueMap;
use rand::Rng;
use sha2::{Digest, Sha512};
use std::fmt;

/// Metadata key holding the bearer token
pub const TOKEN_KEY: &str = "token";

const ID_SEED_BYTES: usize = 64;
const ID_BYTES: usize = 16;

/// Operation kind of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestKind {
    /// Not mapped to any operation
    #[default]
    Unknown,
    /// Read
    Pull,
    /// Create
    Push,
    /// Modify
    Update,
    /// Remove
    Delete,
}

impl RequestKind {
    /// Name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome status of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Success
    #[default]
    Ok,
    /// Unexpected failure
    InternalError,
    /// Payload failed contract validation
    InvalidData,
    /// Operation not allowed
    NotAllowed,
    /// Authenticated but not permitted
    NotAuthorized,
    /// Private route without a bearer token
    AuthenticationRequired,
    /// New resource created
    ResourceCreated,
    /// No route or no such resource
    ResourceNotFound,
    /// Resource already present
    ResourceAlreadyExists,
}

impl Status {
    /// Stable status name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InternalError => "InternalError",
            Self::InvalidData => "InvalidData",
            Self::NotAllowed => "NotAllowed",
            Self::NotAuthorized => "NotAuthorized",
            Self::AuthenticationRequired => "AuthenticationRequired",
            Self::ResourceCreated => "ResourceCreated",
            Self::ResourceNotFound => "ResourceNotFound",
            Self::ResourceAlreadyExists => "ResourceAlreadyExists",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound operation
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id, for logs only
    pub id: String,
    /// Operation kind
    pub kind: RequestKind,
    /// Path as received (leading/trailing slashes allowed)
    pub path: String,
    /// Request data
    pub payload: ValueMap,
    /// Side-channel data such as the bearer token
    pub metadata: ValueMap,
    /// Variables bound by the matched route template
    pub route_data: ValueMap,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Create an empty request with a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: generate_request_id(),
            kind: RequestKind::Unknown,
            path: String::new(),
            payload: ValueMap::new(),
            metadata: ValueMap::new(),
            route_data: ValueMap::new(),
        }
    }

    /// Set the operation kind
    #[must_use]
    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Replace the payload
    #[must_use]
    pub fn with_payload(mut self, payload: ValueMap) -> Self {
        self.payload = payload;
        self
    }

    /// Attach a bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.metadata.set(TOKEN_KEY, token.into());
        self
    }

    /// Bearer token, if a non-empty one was supplied
    #[must_use]
    pub fn token(&self) -> Option<String> {
        let token = self.metadata.get_string(TOKEN_KEY, "");
        (!token.is_empty()).then_some(token)
    }
}

/// Outbound result of one request
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Id of the originating request
    pub request_id: String,
    /// Outcome
    pub status: Status,
    /// Result data
    pub payload: ValueMap,
    /// Side-channel data
    pub metadata: ValueMap,
}

impl Response {
    /// Create an empty `OK` response for a request id
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: Status::Ok,
            payload: ValueMap::new(),
            metadata: ValueMap::new(),
        }
    }

    /// Create an empty response for a request
    #[must_use]
    pub fn for_request(request: &Request) -> Self {
        Self::new(request.id.clone())
    }
}

/// Generate a correlation id
///
/// Hex of a random 16-byte window of a SHA-512 digest over 64 random bytes.
/// Not a security token and not guaranteed unique.
fn generate_request_id() -> String {
    let mut rng = rand::rng();
    let mut seed = [0u8; ID_SEED_BYTES];
    rng.fill(&mut seed[..]);
    let digest = Sha512::digest(seed);
    let start = rng.random_range(0..=digest.len() - ID_BYTES);
    hex::encode(&digest[start..start + ID_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_shape() {
        let request = Request::new();
        assert_eq!(request.id.len(), ID_BYTES * 2);
        assert!(request.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_request_ids_differ() {
        let a = Request::new();
        let b = Request::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_new_request_is_empty() {
        let request = Request::new();
        assert_eq!(request.kind, RequestKind::Unknown);
        assert!(request.path.is_empty());
        assert!(request.payload.is_empty());
        assert!(request.metadata.is_empty());
        assert!(request.token().is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new()
            .with_kind(RequestKind::Push)
            .with_path("/notes")
            .with_token("abc");
        assert_eq!(request.kind, RequestKind::Push);
        assert_eq!(request.path, "/notes");
        assert_eq!(request.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let request = Request::new().with_token("");
        assert!(request.token().is_none());
    }

    #[test]
    fn test_new_response_defaults() {
        let request = Request::new();
        let response = Response::for_request(&request);
        assert_eq!(response.request_id, request.id);
        assert_eq!(response.status, Status::Ok);
        assert!(response.payload.is_empty());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(RequestKind::Pull.to_string(), "pull");
        assert_eq!(Status::AuthenticationRequired.to_string(), "AuthenticationRequired");
    }
}
