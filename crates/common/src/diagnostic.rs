//! Non-fatal diagnostics collected during extraction and binding
//!
//! Diagnostics never interrupt a call. They are accumulated and exposed for
//! inspection on the owning collection or binding result.

use crate::HttpMethod;
use serde::Serialize;
use std::fmt;

/// A non-fatal condition noticed while extracting or binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// A declared parameter uses an `in` kind the core does not consume
    /// (header, cookie, body). The entry is skipped, not rejected.
    UnsupportedParameterKind {
        name: String,
        kind: String,
        path: String,
        method: HttpMethod,
    },

    /// A parameter declared `in: path` has no matching `{name}` placeholder
    /// in the path template. The entry is omitted from the endpoint.
    OrphanedPathParameter {
        name: String,
        path: String,
        method: HttpMethod,
    },

    /// A bound path value contains a `/`, which would change the route.
    /// Escaping is the transport's concern; the core only flags it.
    SeparatorInPathValue { name: String, value: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedParameterKind {
                name,
                kind,
                path,
                method,
            } => write!(
                f,
                "unsupported parameter kind '{}' for '{}' on {} {}",
                kind, name, method, path
            ),
            Diagnostic::OrphanedPathParameter { name, path, method } => write!(
                f,
                "path parameter '{}' has no placeholder in {} {}",
                name, method, path
            ),
            Diagnostic::SeparatorInPathValue { name, value } => write!(
                f,
                "value '{}' bound to path parameter '{}' contains a path separator",
                value, name
            ),
        }
    }
}
