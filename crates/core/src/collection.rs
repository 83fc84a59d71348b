//! The addressable endpoint registry

use crate::bind::{bind, Binding, CallerInput};
use apibind_common::{ApiBindError, Diagnostic, Endpoint, HttpMethod, ParamSpec, Result};
use apibind_parser::{extract_endpoints, SpecDocument};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Registry of endpoints plus collection-level shared parameter defaults
///
/// Keys are unique; iteration preserves insertion order. The collection is
/// not internally synchronized — concurrent mutation from multiple threads
/// is the caller's responsibility to serialize.
#[derive(Debug, Clone, Default)]
pub struct EndpointCollection {
    keys: Vec<String>,
    endpoints: HashMap<String, Endpoint>,
    shared_params: BTreeMap<String, Value>,
    diagnostics: Vec<Diagnostic>,
}

impl EndpointCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a collection from a parsed specification document
    ///
    /// Endpoints are keyed by their raw path; when a path declares several
    /// methods, each gets a `method:path` key instead. Extraction
    /// diagnostics are retained on the collection.
    pub fn from_spec(document: &SpecDocument) -> Self {
        let extraction = extract_endpoints(document);

        let mut methods_per_path: HashMap<String, usize> = HashMap::new();
        for extracted in &extraction.endpoints {
            *methods_per_path.entry(extracted.path.clone()).or_default() += 1;
        }

        let mut collection = Self::new();
        collection.diagnostics = extraction.diagnostics;
        for extracted in extraction.endpoints {
            let key = if methods_per_path[extracted.path.as_str()] > 1 {
                format!("{}:{}", extracted.endpoint.method(), extracted.path)
            } else {
                extracted.path
            };
            // Keys are unique by construction: one entry per (path, method)
            let _ = collection.register(key, extracted.endpoint, false);
        }
        collection
    }

    /// Register an endpoint under a key
    ///
    /// Fails with `DuplicateEndpoint` when the key is taken and
    /// `allow_overwrite` is false; the existing entry is left untouched.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        endpoint: Endpoint,
        allow_overwrite: bool,
    ) -> Result<()> {
        let key = key.into();
        if self.endpoints.contains_key(&key) {
            if !allow_overwrite {
                return Err(ApiBindError::DuplicateEndpoint(key));
            }
        } else {
            self.keys.push(key.clone());
        }
        self.endpoints.insert(key, endpoint);
        Ok(())
    }

    /// Manually declare and register an endpoint
    ///
    /// `params` entries whose names match a `{placeholder}` in the template
    /// become path-parameter defaults; the rest become optional query
    /// parameters with defaults. `path_params` addresses placeholders
    /// directly; entries naming no placeholder are recorded as orphaned
    /// diagnostics. The key is `alias` when given, else the raw template.
    pub fn add_endpoint(
        &mut self,
        path_template: &str,
        method: &str,
        params: BTreeMap<String, Value>,
        path_params: BTreeMap<String, Value>,
        alias: Option<&str>,
    ) -> Result<String> {
        let method = HttpMethod::parse(method)?;
        let mut endpoint = Endpoint::new(method, path_template);

        for (name, value) in path_params {
            let spec = ParamSpec::required().with_default(value);
            if !endpoint.set_path_param(&name, spec) {
                self.diagnostics.push(Diagnostic::OrphanedPathParameter {
                    name,
                    path: path_template.to_string(),
                    method,
                });
            }
        }
        for (name, value) in params {
            let installed = endpoint
                .set_path_param(&name, ParamSpec::required().with_default(value.clone()));
            if !installed {
                endpoint.set_query_param(name, ParamSpec::optional().with_default(value));
            }
        }

        let key = alias.unwrap_or(path_template).to_string();
        self.register(key.clone(), endpoint, false)?;
        Ok(key)
    }

    /// Look up an endpoint by key
    pub fn get(&self, key: &str) -> Result<&Endpoint> {
        self.endpoints
            .get(key)
            .ok_or_else(|| ApiBindError::UnknownEndpoint(key.to_string()))
    }

    /// All (key, endpoint) pairs in insertion order
    pub fn list(&self) -> Vec<(&str, &Endpoint)> {
        self.keys
            .iter()
            .map(|key| (key.as_str(), &self.endpoints[key]))
            .collect()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Replace the shared-parameter mapping
    ///
    /// Replacement, not a merge: callers wanting additive behavior must
    /// read-modify-write via [`shared_params`](Self::shared_params).
    pub fn set_shared_params(&mut self, params: BTreeMap<String, Value>) {
        self.shared_params = params;
    }

    pub fn shared_params(&self) -> &BTreeMap<String, Value> {
        &self.shared_params
    }

    /// Non-fatal diagnostics accumulated by extraction and binding
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Remove the named endpoints; fails on the first unknown key
    pub fn remove_endpoints(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            if !self.endpoints.contains_key(*key) {
                return Err(ApiBindError::UnknownEndpoint(key.to_string()));
            }
        }
        for key in keys {
            self.endpoints.remove(*key);
        }
        self.keys.retain(|k| self.endpoints.contains_key(k));
        Ok(())
    }

    /// Keep only the named endpoints
    pub fn keep_endpoints(&mut self, keys: &[&str]) {
        self.endpoints.retain(|k, _| keys.contains(&k.as_str()));
        self.keys.retain(|k| self.endpoints.contains_key(k));
    }

    /// Bind the endpoint under `key` with the collection's shared parameters
    /// beneath the caller tier
    ///
    /// Binding warnings are retained on the collection's diagnostics.
    pub fn bind(&mut self, key: &str, caller: &CallerInput) -> Result<Binding> {
        let endpoint = self.get(key)?;
        let binding = bind(key, endpoint, &self.shared_params, caller)?;
        self.diagnostics.extend(binding.warnings.iter().cloned());
        Ok(binding)
    }

    pub(crate) fn push_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_duplicate_fails_and_keeps_first() {
        let mut collection = EndpointCollection::new();
        let first = Endpoint::new(HttpMethod::Get, "/users");
        let second = Endpoint::new(HttpMethod::Post, "/users");

        collection.register("users", first.clone(), false).unwrap();
        let err = collection.register("users", second, false).unwrap_err();
        assert!(matches!(err, ApiBindError::DuplicateEndpoint(ref k) if k == "users"));

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("users").unwrap(), &first);
    }

    #[test]
    fn test_register_overwrite_allowed() {
        let mut collection = EndpointCollection::new();
        collection
            .register("users", Endpoint::new(HttpMethod::Get, "/users"), false)
            .unwrap();
        collection
            .register("users", Endpoint::new(HttpMethod::Post, "/users"), true)
            .unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("users").unwrap().method(), HttpMethod::Post);
    }

    #[test]
    fn test_get_unknown_endpoint() {
        let collection = EndpointCollection::new();
        let err = collection.get("/missing").unwrap_err();
        assert!(matches!(err, ApiBindError::UnknownEndpoint(ref k) if k == "/missing"));
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut collection = EndpointCollection::new();
        for key in ["zebra", "alpha", "middle"] {
            collection
                .register(key, Endpoint::new(HttpMethod::Get, "/x"), false)
                .unwrap();
        }
        let keys: Vec<&str> = collection.list().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zebra", "alpha", "middle"]);
    }

    #[test]
    fn test_set_shared_params_replaces() {
        let mut collection = EndpointCollection::new();
        collection.set_shared_params(BTreeMap::from([("a".to_string(), json!(1))]));
        collection.set_shared_params(BTreeMap::from([("b".to_string(), json!(2))]));
        assert!(!collection.shared_params().contains_key("a"));
        assert_eq!(collection.shared_params()["b"], json!(2));
    }

    #[test]
    fn test_add_endpoint_routes_params() {
        let mut collection = EndpointCollection::new();
        let key = collection
            .add_endpoint(
                "/users/{user_id}",
                "GET",
                BTreeMap::from([
                    ("user_id".to_string(), json!(1)),
                    ("format".to_string(), json!("json")),
                ]),
                BTreeMap::new(),
                Some("user"),
            )
            .unwrap();
        assert_eq!(key, "user");

        let endpoint = collection.get("user").unwrap();
        assert_eq!(endpoint.path_param("user_id").unwrap().default, Some(json!(1)));
        assert_eq!(endpoint.query_params()["format"].default, Some(json!("json")));
    }

    #[test]
    fn test_add_endpoint_invalid_method() {
        let mut collection = EndpointCollection::new();
        let err = collection
            .add_endpoint("/x", "FETCH", BTreeMap::new(), BTreeMap::new(), None)
            .unwrap_err();
        assert!(matches!(err, ApiBindError::InvalidMethod(_)));
    }

    #[test]
    fn test_add_endpoint_orphaned_path_param_diagnostic() {
        let mut collection = EndpointCollection::new();
        collection
            .add_endpoint(
                "/users",
                "get",
                BTreeMap::new(),
                BTreeMap::from([("user_id".to_string(), json!(1))]),
                None,
            )
            .unwrap();
        assert!(matches!(
            collection.diagnostics()[0],
            Diagnostic::OrphanedPathParameter { ref name, .. } if name == "user_id"
        ));
    }

    #[test]
    fn test_from_spec_keying() {
        let document = SpecDocument::from_json(
            r#"{
                "paths": {
                    "/users": {"get": {}, "post": {}},
                    "/health": {"get": {}}
                }
            }"#,
        )
        .unwrap();
        let collection = EndpointCollection::from_spec(&document);

        let keys: Vec<&str> = collection.keys().collect();
        assert_eq!(keys, vec!["/health", "get:/users", "post:/users"]);
        assert_eq!(collection.get("/health").unwrap().method(), HttpMethod::Get);
        assert_eq!(
            collection.get("post:/users").unwrap().method(),
            HttpMethod::Post
        );
    }

    #[test]
    fn test_remove_and_keep_endpoints() {
        let mut collection = EndpointCollection::new();
        for key in ["a", "b", "c"] {
            collection
                .register(key, Endpoint::new(HttpMethod::Get, "/x"), false)
                .unwrap();
        }

        collection.remove_endpoints(&["b"]).unwrap();
        assert_eq!(collection.keys().collect::<Vec<_>>(), vec!["a", "c"]);

        let err = collection.remove_endpoints(&["missing"]).unwrap_err();
        assert!(matches!(err, ApiBindError::UnknownEndpoint(_)));
        // Failed removal leaves the collection untouched
        assert_eq!(collection.len(), 2);

        collection.keep_endpoints(&["c"]);
        assert_eq!(collection.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_bind_applies_shared_params() {
        let mut collection = EndpointCollection::new();
        collection
            .add_endpoint("/data", "get", BTreeMap::new(), BTreeMap::new(), None)
            .unwrap();
        collection.set_shared_params(BTreeMap::from([("api_key".to_string(), json!("k"))]));

        let binding = collection.bind("/data", &CallerInput::new()).unwrap();
        assert_eq!(binding.request.query["api_key"], "k");
    }
}
