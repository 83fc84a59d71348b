//! Endpoint extraction from a normalized specification document

use crate::document::{Operation, RawParameter, SpecDocument};
use apibind_common::{Diagnostic, Endpoint, HttpMethod, ParamSpec};

/// One extracted (path, method) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEndpoint {
    /// Raw path string the endpoint was declared under
    pub path: String,
    pub endpoint: Endpoint,
}

/// The endpoints and diagnostics produced by one extraction pass
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub endpoints: Vec<ExtractedEndpoint>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract one endpoint per declared (path, method) pair
///
/// Paths are walked in the document's normalized (sorted) order and verbs in
/// fixed declaration order, so the same document always yields the same
/// descriptors in the same sequence.
pub fn extract_endpoints(document: &SpecDocument) -> Extraction {
    let mut extraction = Extraction::default();

    for (path, item) in &document.paths {
        for (method, operation) in item.operations() {
            let endpoint = build_endpoint(
                path,
                method,
                &item.parameters,
                operation,
                &mut extraction.diagnostics,
            );
            extraction.endpoints.push(ExtractedEndpoint {
                path: path.clone(),
                endpoint,
            });
        }
    }

    extraction
}

fn build_endpoint(
    path: &str,
    method: HttpMethod,
    path_level: &[RawParameter],
    operation: &Operation,
    diagnostics: &mut Vec<Diagnostic>,
) -> Endpoint {
    let mut endpoint =
        Endpoint::new(method, path).with_description(operation.matching_text());

    // Path-level parameters apply to every operation; an operation-level
    // re-declaration of the same name wins because it is applied last.
    for param in path_level.iter().chain(operation.parameters.iter()) {
        apply_parameter(&mut endpoint, param, path, method, diagnostics);
    }

    endpoint
}

fn apply_parameter(
    endpoint: &mut Endpoint,
    param: &RawParameter,
    path: &str,
    method: HttpMethod,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let spec = ParamSpec {
        required: param.required,
        default: param.default_value().cloned(),
        description: param.description.clone().unwrap_or_default(),
    };

    match param.location.as_str() {
        "path" => {
            if !endpoint.set_path_param(&param.name, spec) {
                diagnostics.push(Diagnostic::OrphanedPathParameter {
                    name: param.name.clone(),
                    path: path.to_string(),
                    method,
                });
            }
        }
        "query" => endpoint.set_query_param(&param.name, spec),
        other => diagnostics.push(Diagnostic::UnsupportedParameterKind {
            name: param.name.clone(),
            kind: other.to_string(),
            path: path.to_string(),
            method,
        }),
    }
}
