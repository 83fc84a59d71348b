//! Natural-language endpoint resolution backed by a model-invocation service
//!
//! The model only ever sees a compact structured projection of the
//! collection's endpoints, never raw specification text. Its response is
//! constrained to a schema and validated before anything touches the
//! collection; validation failure earns exactly one retry.

use crate::bind::{bind, BoundRequest, CallerInput};
use crate::collection::EndpointCollection;
use apibind_common::{ApiBindError, HttpMethod, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Model-invocation service contract
///
/// Takes a free-text prompt, the candidate catalogue, and the schema the
/// response must conform to; returns a schema-conformant structured value or
/// a failure. Treated as pure and side-effect-free by the core.
#[cfg_attr(test, mockall::automock)]
pub trait ModelService {
    fn invoke(&self, prompt: &str, catalogue: &Value, output_schema: &Value) -> Result<Value>;
}

/// One parameter as the model sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogueParam {
    pub name: String,
    pub description: String,
}

/// One endpoint as the model sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogueEntry {
    pub key: String,
    pub method: HttpMethod,
    pub path_template: String,
    pub path_params: Vec<CatalogueParam>,
    pub query_params: Vec<CatalogueParam>,
    pub description: String,
}

/// Project a collection into the model-consumable candidate catalogue
pub fn build_catalogue(collection: &EndpointCollection) -> Vec<CatalogueEntry> {
    collection
        .list()
        .into_iter()
        .map(|(key, endpoint)| CatalogueEntry {
            key: key.to_string(),
            method: endpoint.method(),
            path_template: endpoint.path_template().to_string(),
            path_params: endpoint
                .path_params()
                .iter()
                .map(|(name, spec)| CatalogueParam {
                    name: name.clone(),
                    description: spec.description.clone(),
                })
                .collect(),
            query_params: endpoint
                .query_params()
                .iter()
                .map(|(name, spec)| CatalogueParam {
                    name: name.clone(),
                    description: spec.description.clone(),
                })
                .collect(),
            description: endpoint.description().to_string(),
        })
        .collect()
}

/// Schema the model's response must conform to
fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "selected_key": {"type": "string"},
            "path_params": {"type": "object"},
            "query_params": {"type": "object"}
        },
        "required": ["selected_key"],
        "additionalProperties": false
    })
}

/// Validated model response
#[derive(Debug, Clone)]
struct Selection {
    selected_key: String,
    path_params: BTreeMap<String, Value>,
    query_params: BTreeMap<String, Value>,
}

/// Check the model's response against the output schema shape
fn validate_selection(value: &Value) -> Option<Selection> {
    let object = value.as_object()?;
    let selected_key = object.get("selected_key")?.as_str()?.to_string();
    let params_map = |field: &str| -> Option<BTreeMap<String, Value>> {
        match object.get(field) {
            None | Some(Value::Null) => Some(BTreeMap::new()),
            Some(Value::Object(map)) => {
                Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            Some(_) => None,
        }
    };
    Some(Selection {
        selected_key,
        path_params: params_map("path_params")?,
        query_params: params_map("query_params")?,
    })
}

impl EndpointCollection {
    /// Resolve a natural-language request into one bound endpoint and
    /// register it under `alias`
    ///
    /// The model's parameter values form the caller tier, so collection
    /// shared parameters still apply beneath them. On any failure nothing is
    /// added to the collection.
    pub fn smart_add_endpoint(
        &mut self,
        service: &dyn ModelService,
        prompt: &str,
        alias: &str,
    ) -> Result<BoundRequest> {
        let catalogue = serde_json::to_value(build_catalogue(self))?;
        let schema = output_schema();

        let response = service.invoke(prompt, &catalogue, &schema)?;
        let selection = match validate_selection(&response) {
            Some(selection) => selection,
            None => {
                // Single retry on a malformed response
                let retried = service.invoke(prompt, &catalogue, &schema)?;
                validate_selection(&retried).ok_or_else(|| {
                    ApiBindError::UnresolvedEndpoint(
                        "model output failed schema validation after retry".to_string(),
                    )
                })?
            }
        };

        let endpoint = self
            .get(&selection.selected_key)
            .map_err(|_| {
                ApiBindError::UnresolvedEndpoint(format!(
                    "model selected unknown endpoint '{}'",
                    selection.selected_key
                ))
            })?
            .clone();

        let caller = CallerInput {
            params: selection.query_params.clone(),
            path_params: selection.path_params.clone(),
        };
        let binding = bind(&selection.selected_key, &endpoint, self.shared_params(), &caller)?;

        let resolved = endpoint.resolved_copy(&selection.path_params, &selection.query_params);
        self.register(alias, resolved, false)?;
        self.push_diagnostics(binding.warnings);

        Ok(binding.request)
    }
}
