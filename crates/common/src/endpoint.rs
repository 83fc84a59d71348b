//! Endpoint descriptor: one callable (method, path template, parameters)
//! operation

use crate::{HttpMethod, ParamSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One callable API operation
///
/// Immutable after construction: binding produces a [`resolved_copy`] rather
/// than mutating the template. Every `{name}` placeholder in the path
/// template has a matching `path_params` entry and vice versa; the
/// constructor seeds undeclared placeholders as required with no default.
///
/// [`resolved_copy`]: Endpoint::resolved_copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    method: HttpMethod,
    path_template: String,
    /// Ordered by first appearance in the template
    path_params: Vec<(String, ParamSpec)>,
    query_params: BTreeMap<String, ParamSpec>,
    description: String,
}

impl Endpoint {
    /// Create an endpoint from a method and path template
    ///
    /// Placeholders are scanned in order of first appearance and seeded as
    /// required parameters with no default.
    pub fn new(method: HttpMethod, path_template: impl Into<String>) -> Self {
        let path_template = path_template.into();
        let path_params = scan_placeholders(&path_template)
            .into_iter()
            .map(|name| (name, ParamSpec::required()))
            .collect();
        Self {
            method,
            path_template,
            path_params,
            query_params: BTreeMap::new(),
            description: String::new(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /// Path parameters in placeholder order
    pub fn path_params(&self) -> &[(String, ParamSpec)] {
        &self.path_params
    }

    pub fn query_params(&self) -> &BTreeMap<String, ParamSpec> {
        &self.query_params
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the free-text description used for matching
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Look up a path parameter by name
    pub fn path_param(&self, name: &str) -> Option<&ParamSpec> {
        self.path_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// Replace the metadata of an existing path placeholder
    ///
    /// Returns `false` when the template has no such placeholder, so callers
    /// can record the orphaned declaration as a diagnostic.
    pub fn set_path_param(&mut self, name: &str, spec: ParamSpec) -> bool {
        match self.path_params.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                *existing = spec;
                true
            }
            None => false,
        }
    }

    /// Declare or replace a query parameter
    pub fn set_query_param(&mut self, name: impl Into<String>, spec: ParamSpec) {
        self.query_params.insert(name.into(), spec);
    }

    /// Copy of this endpoint with concrete values installed as defaults
    ///
    /// Used when a resolved endpoint is registered back into a collection:
    /// the template stays intact, the values become its new defaults.
    pub fn resolved_copy(
        &self,
        path_values: &BTreeMap<String, Value>,
        query_values: &BTreeMap<String, Value>,
    ) -> Endpoint {
        let mut copy = self.clone();
        for (name, spec) in copy.path_params.iter_mut() {
            if let Some(value) = path_values.get(name) {
                spec.default = Some(value.clone());
            }
        }
        for (name, value) in query_values {
            copy.query_params
                .entry(name.clone())
                .or_insert_with(ParamSpec::optional)
                .default = Some(value.clone());
        }
        copy
    }
}

/// Scan `{identifier}` placeholders in order of first appearance
///
/// Repeated placeholders are reported once. Empty braces are ignored.
pub fn scan_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for ch in template.chars() {
        if ch == '{' {
            current = Some(String::new());
        } else if ch == '}' {
            if let Some(name) = current.take() {
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
        } else if let Some(name) = current.as_mut() {
            name.push(ch);
        }
    }

    names
}
