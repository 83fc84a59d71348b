//! Common types and utilities for apibind
//!
//! This crate contains the shared error taxonomy, the HTTP method enum, the
//! endpoint descriptor, parameter metadata, and the non-fatal diagnostics
//! collected during extraction and binding.

mod diagnostic;
mod endpoint;
mod method;
mod param;

pub use diagnostic::Diagnostic;
pub use endpoint::{scan_placeholders, Endpoint};
pub use method::HttpMethod;
pub use param::ParamSpec;

use thiserror::Error;

/// Errors that can occur while parsing specifications, binding parameters,
/// or resolving endpoints
#[derive(Error, Debug)]
pub enum ApiBindError {
    #[error("Invalid specification document: {0}")]
    InvalidSpecDocument(String),

    #[error("Unresolvable reference: {0}")]
    UnresolvableReference(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Endpoint already registered under key '{0}'")]
    DuplicateEndpoint(String),

    #[error("Missing required parameter '{parameter}' for endpoint '{endpoint}'")]
    MissingRequiredParameter { parameter: String, endpoint: String },

    #[error("Could not resolve endpoint: {0}")]
    UnresolvedEndpoint(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for apibind operations
pub type Result<T> = std::result::Result<T, ApiBindError>;
