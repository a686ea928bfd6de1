//! # Switchyard Core
//!
//! Core runtime library for the Switchyard request-dispatch framework.
//! Provides dynamically typed value maps, declarative payload contracts,
//! segment-based routing and a thin HTTP adapter.
//!
//! ## Architecture
//!
//! Handlers are registered on a [`Router`] at startup. Sealing the router
//! yields a [`Dispatcher`], which any transport can drive: each inbound
//! request is routed by kind and path, gated on a bearer token for private
//! routes, validated against the route's [`Contract`], then handed to the
//! handler.
//!
//! ## Modules
//!
//! - `value` / `value_map` - Dynamically typed values with lenient coercion
//! - `record` - Projection between maps and plain structs
//! - `contract` - Declarative payload schemas
//! - `validation` - Structured validation errors
//! - `request` - Transport-neutral request/response model
//! - `route` - Route templates and matching rules
//! - `router` - Route registration and dispatch
//! - `config` - Layered configuration providers
//! - `json` - JSON parsing with simd-json
//! - `server` - HTTP server built on Hyper
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod contract;
pub mod error;
pub mod json;
pub mod record;
pub mod request;
pub mod route;
pub mod router;
pub mod server;
pub mod validation;
pub mod value;
pub mod value_map;

pub use config::{ArgsProvider, Config, ConfigProvider, EnvironmentProvider, FileProvider};
pub use contract::{Contract, Field, FloatField, IntegerField, StringField};
pub use error::{Error, HandlerError, HandlerResult, Result};
pub use json::{parse_object, to_json};
pub use record::{Record, RecordField};
pub use request::{Request, RequestKind, Response, Status};
pub use route::RouteInfo;
pub use router::{Dispatcher, Handler, Router};
pub use server::{Bytes, Method, Reply, Server, ServerConfig};
pub use validation::{FieldError, ValidationCode, ValidationErrors};
pub use value::{Value, ValueKind};
pub use value_map::ValueMap;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
