//! Specification document loading and normalization

use apibind_common::{ApiBindError, HttpMethod, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Declared format of a specification document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

/// Normalized specification document
///
/// Paths are kept in a `BTreeMap` so that extraction walks them in a stable
/// order regardless of how the source document ordered its keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecDocument {
    /// API metadata
    #[serde(default)]
    pub info: Info,

    /// Server base URLs
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Path string -> operations
    pub paths: BTreeMap<String, PathItem>,
}

/// API information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub version: Option<String>,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Operations declared under one path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    /// Parameters shared by every operation under this path
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

impl PathItem {
    /// Operation declared for a verb, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
        }
    }

    /// Declared operations in fixed verb order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .iter()
            .filter_map(move |m| self.operation(*m).map(|op| (*m, op)))
    }
}

/// One HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

impl Operation {
    /// Text used for endpoint matching: summary, else description, else empty
    pub fn matching_text(&self) -> String {
        self.summary
            .clone()
            .or_else(|| self.description.clone())
            .unwrap_or_default()
    }
}

/// Parameter declaration as it appears in the document
///
/// Defaults live inline in Swagger 2 documents and under `schema` in
/// OpenAPI 3 documents; both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawParameter {
    pub name: String,

    /// Location: path, query, header, cookie, body
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default)]
    pub schema: Option<ParameterSchema>,
}

impl RawParameter {
    /// Declared default, wherever the document put it
    pub fn default_value(&self) -> Option<&Value> {
        self.default
            .as_ref()
            .or_else(|| self.schema.as_ref().and_then(|s| s.default.as_ref()))
    }
}

/// The slice of a parameter schema the extractor consumes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default)]
    pub default: Option<Value>,
}

impl SpecDocument {
    /// Load a document from a file, detecting the format from the extension
    /// (falling back to a content sniff)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ApiBindError::InvalidSpecDocument(format!(
                "Failed to read spec file {}: {}",
                path.display(),
                e
            ))
        })?;
        match detect_format(path, &content) {
            SpecFormat::Json => Self::from_json(&content),
            SpecFormat::Yaml => Self::from_yaml(&content),
        }
    }

    /// Parse a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            ApiBindError::InvalidSpecDocument(format!("Failed to parse JSON: {}", e))
        })?;
        Self::from_value(value)
    }

    /// Parse a document from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| {
            ApiBindError::InvalidSpecDocument(format!("Failed to parse YAML: {}", e))
        })?;
        Self::from_value(value)
    }

    /// Normalize an already-loaded document tree
    ///
    /// Resolves `$ref` indirections against the document root, then types
    /// the tree. Structural problems surface as `InvalidSpecDocument` with a
    /// pointer to the offending location.
    pub fn from_value(value: Value) -> Result<Self> {
        let resolved = resolve_refs(&value)?;

        match resolved.get("paths") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(ApiBindError::InvalidSpecDocument(
                    "'paths' at the document root must be an object".to_string(),
                ))
            }
            None => {
                return Err(ApiBindError::InvalidSpecDocument(
                    "missing required key 'paths' at the document root".to_string(),
                ))
            }
        }

        serde_json::from_value(resolved).map_err(|e| {
            ApiBindError::InvalidSpecDocument(format!("Malformed document: {}", e))
        })
    }

    /// Server base URLs declared by the document
    pub fn server_urls(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.url.as_str()).collect()
    }
}

/// Detect spec format from file extension, falling back to content sniffing
fn detect_format(path: &Path, content: &str) -> SpecFormat {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => return SpecFormat::Yaml,
            "json" => return SpecFormat::Json,
            _ => {}
        }
    }

    match content.trim_start().chars().next() {
        Some('{') | Some('[') => SpecFormat::Json,
        _ => SpecFormat::Yaml,
    }
}

/// Replace every `{"$ref": "#/..."}` object with a deep copy of its target
///
/// Nested references inside a target are resolved in turn; a chain that
/// re-enters a fragment it is already resolving fails rather than recursing
/// forever.
fn resolve_refs(root: &Value) -> Result<Value> {
    let mut active = Vec::new();
    resolve_node(root, root, &mut active)
}

fn resolve_node(node: &Value, root: &Value, active: &mut Vec<String>) -> Result<Value> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(fragment)) = map.get("$ref") {
                return resolve_fragment(fragment, root, active);
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), resolve_node(value, root, active)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_node(item, root, active))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_fragment(fragment: &str, root: &Value, active: &mut Vec<String>) -> Result<Value> {
    if !fragment.starts_with("#/") {
        return Err(ApiBindError::UnresolvableReference(format!(
            "unsupported reference '{}': only document-local fragments are resolved",
            fragment
        )));
    }
    if active.iter().any(|f| f == fragment) {
        return Err(ApiBindError::UnresolvableReference(format!(
            "reference cycle through '{}'",
            fragment
        )));
    }

    let mut current = root;
    for raw_segment in fragment[2..].split('/') {
        // JSON Pointer unescaping, ~1 before ~0
        let segment = raw_segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| {
            ApiBindError::UnresolvableReference(format!(
                "'{}' has no segment '{}'",
                fragment, segment
            ))
        })?;
    }

    active.push(fragment.to_string());
    let resolved = resolve_node(current, root, active);
    active.pop();
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let doc = SpecDocument::from_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "Test API", "version": "1.0.0"},
                "paths": {}
            }"#,
        )
        .unwrap();
        assert_eq!(doc.info.title, "Test API");
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn test_missing_paths_is_invalid() {
        let err = SpecDocument::from_json(r#"{"info": {"title": "T"}}"#).unwrap_err();
        match err {
            ApiBindError::InvalidSpecDocument(msg) => assert!(msg.contains("paths")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_paths_must_be_an_object() {
        let err = SpecDocument::from_json(r#"{"paths": []}"#).unwrap_err();
        assert!(matches!(err, ApiBindError::InvalidSpecDocument(_)));
    }

    #[test]
    fn test_yaml_input() {
        let doc = SpecDocument::from_yaml(
            "info:\n  title: Yaml API\npaths:\n  /users:\n    get:\n      summary: List users\n",
        )
        .unwrap();
        assert_eq!(doc.info.title, "Yaml API");
        let item = &doc.paths["/users"];
        assert_eq!(item.get.as_ref().unwrap().summary.as_deref(), Some("List users"));
    }

    #[test]
    fn test_ref_resolution_inlines_target() {
        let doc = SpecDocument::from_json(
            r##"{
                "paths": {
                    "/users/{id}": {
                        "get": {
                            "parameters": [{"$ref": "#/components/parameters/Id"}]
                        }
                    }
                },
                "components": {
                    "parameters": {
                        "Id": {"name": "id", "in": "path", "required": true}
                    }
                }
            }"##,
        )
        .unwrap();
        let op = doc.paths["/users/{id}"].get.as_ref().unwrap();
        assert_eq!(op.parameters[0].name, "id");
        assert_eq!(op.parameters[0].location, "path");
        assert!(op.parameters[0].required);
    }

    #[test]
    fn test_missing_ref_target() {
        let err = SpecDocument::from_json(
            r##"{
                "paths": {
                    "/a": {"get": {"parameters": [{"$ref": "#/components/parameters/Nope"}]}}
                },
                "components": {"parameters": {}}
            }"##,
        )
        .unwrap_err();
        match err {
            ApiBindError::UnresolvableReference(msg) => assert!(msg.contains("Nope")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_referential_ref_cycle() {
        let err = SpecDocument::from_json(
            r##"{
                "paths": {"/a": {"get": {"parameters": [{"$ref": "#/components/parameters/Loop"}]}}},
                "components": {"parameters": {"Loop": {"$ref": "#/components/parameters/Loop"}}}
            }"##,
        )
        .unwrap_err();
        match err {
            ApiBindError::UnresolvableReference(msg) => assert!(msg.contains("cycle")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_indirect_ref_cycle() {
        let err = SpecDocument::from_json(
            r##"{
                "paths": {"/a": {"get": {"parameters": [{"$ref": "#/components/a"}]}}},
                "components": {
                    "a": {"$ref": "#/components/b"},
                    "b": {"$ref": "#/components/a"}
                }
            }"##,
        )
        .unwrap_err();
        assert!(matches!(err, ApiBindError::UnresolvableReference(_)));
    }

    #[test]
    fn test_external_ref_is_unresolvable() {
        let err = SpecDocument::from_json(
            r#"{"paths": {"/a": {"get": {"parameters": [{"$ref": "other.json#/x"}]}}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiBindError::UnresolvableReference(_)));
    }

    #[test]
    fn test_json_pointer_escapes() {
        let doc = SpecDocument::from_json(
            r##"{
                "paths": {"/a": {"get": {"parameters": [{"$ref": "#/components/parameters/a~1b"}]}}},
                "components": {"parameters": {"a/b": {"name": "q", "in": "query"}}}
            }"##,
        )
        .unwrap();
        let op = doc.paths["/a"].get.as_ref().unwrap();
        assert_eq!(op.parameters[0].name, "q");
    }

    #[test]
    fn test_swagger2_inline_default_and_openapi3_schema_default() {
        let doc = SpecDocument::from_json(
            r#"{
                "paths": {
                    "/a": {
                        "get": {
                            "parameters": [
                                {"name": "v2", "in": "query", "default": 10},
                                {"name": "v3", "in": "query", "schema": {"default": "x"}}
                            ]
                        }
                    }
                }
            }"#,
        )
        .unwrap();
        let op = doc.paths["/a"].get.as_ref().unwrap();
        assert_eq!(op.parameters[0].default_value(), Some(&serde_json::json!(10)));
        assert_eq!(op.parameters[1].default_value(), Some(&serde_json::json!("x")));
    }

    #[test]
    fn test_detect_format_sniffs_content() {
        assert_eq!(
            detect_format(Path::new("spec"), "  {\"paths\": {}}"),
            SpecFormat::Json
        );
        assert_eq!(detect_format(Path::new("spec"), "paths: {}"), SpecFormat::Yaml);
        assert_eq!(
            detect_format(Path::new("spec.yml"), "{\"paths\": {}}"),
            SpecFormat::Yaml
        );
    }
}
