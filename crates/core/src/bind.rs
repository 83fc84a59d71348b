//! Parameter binding: merging endpoint defaults, shared parameters, and
//! caller input into a concrete request
//!
//! Binding is a pure function so a transport layer can wrap it in whatever
//! connection-reuse scheme it chooses.

use apibind_common::{ApiBindError, Diagnostic, Endpoint, HttpMethod, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller-supplied values for one binding
///
/// Entries in `params` whose names match a path placeholder bind the
/// placeholder; the rest become query parameters. `path_params` addresses
/// placeholders explicitly and yields to `params` on the same name.
#[derive(Debug, Clone, Default)]
pub struct CallerInput {
    pub params: BTreeMap<String, Value>,
    pub path_params: BTreeMap<String, Value>,
}

impl CallerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.path_params.insert(name.into(), value);
        self
    }
}

/// Fully bound request: concrete method, substituted path, final query map
///
/// Ephemeral; handed straight to a transport collaborator. Values are not
/// URL-escaped here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: BTreeMap<String, String>,
}

/// A bound request plus the non-fatal warnings binding raised
#[derive(Debug, Clone)]
pub struct Binding {
    pub request: BoundRequest,
    pub warnings: Vec<Diagnostic>,
}

/// Bind an endpoint's parameters to concrete values
///
/// Precedence, highest first: caller-supplied, collection shared parameters,
/// endpoint-declared default. Unknown caller keys pass through as query
/// parameters rather than being rejected. `key` identifies the endpoint in
/// error messages.
pub fn bind(
    key: &str,
    endpoint: &Endpoint,
    shared_params: &BTreeMap<String, Value>,
    caller: &CallerInput,
) -> Result<Binding> {
    let mut warnings = Vec::new();

    // Path substitution
    let mut path = endpoint.path_template().to_string();
    for (name, spec) in endpoint.path_params() {
        let value = caller
            .params
            .get(name)
            .or_else(|| caller.path_params.get(name))
            .or_else(|| shared_params.get(name))
            .or(spec.default.as_ref())
            .ok_or_else(|| ApiBindError::MissingRequiredParameter {
                parameter: name.clone(),
                endpoint: key.to_string(),
            })?;
        let rendered = stringify(value);
        if rendered.contains('/') {
            warnings.push(Diagnostic::SeparatorInPathValue {
                name: name.clone(),
                value: rendered.clone(),
            });
        }
        path = path.replace(&format!("{{{}}}", name), &rendered);
    }

    let is_path_param = |name: &str| endpoint.path_params().iter().any(|(n, _)| n == name);

    // Declared query parameters, by precedence
    let mut query = BTreeMap::new();
    for (name, spec) in endpoint.query_params() {
        let value = caller
            .params
            .get(name)
            .or_else(|| shared_params.get(name))
            .or(spec.default.as_ref());
        match value {
            Some(v) => {
                query.insert(name.clone(), stringify(v));
            }
            None if spec.required => {
                return Err(ApiBindError::MissingRequiredParameter {
                    parameter: name.clone(),
                    endpoint: key.to_string(),
                })
            }
            None => {}
        }
    }

    // Shared parameters apply to every binding unless overridden
    for (name, value) in shared_params {
        if is_path_param(name)
            || endpoint.query_params().contains_key(name)
            || caller.params.contains_key(name)
        {
            continue;
        }
        query.insert(name.clone(), stringify(value));
    }

    // Undeclared caller keys pass through; specifications are frequently
    // incomplete and rigid rejection would break otherwise-valid calls
    for (name, value) in &caller.params {
        if is_path_param(name) || endpoint.query_params().contains_key(name) {
            continue;
        }
        query.insert(name.clone(), stringify(value));
    }

    Ok(Binding {
        request: BoundRequest {
            method: endpoint.method(),
            path,
            query,
        },
        warnings,
    })
}

/// Render a bound value: strings unquoted, other values in their JSON form
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
