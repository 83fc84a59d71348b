//! Specification parsing for apibind
//!
//! This crate loads OpenAPI/Swagger documents (JSON or YAML), resolves
//! internal `$ref` indirections, and extracts one [`Endpoint`] descriptor per
//! `(path, method)` pair.
//!
//! ## Parsing strategy
//!
//! Documents are first read into a raw `serde_json::Value` tree so that
//! `$ref` fragments can be resolved against the full document before the
//! tree is typed. Only the subset needed for endpoint matching and
//! invocation is modeled: `paths`, per-verb operations, `parameters`,
//! `summary`/`description`, `servers`, and `info`. Unrecognized keys are
//! ignored.
//!
//! [`Endpoint`]: apibind_common::Endpoint

mod document;
mod extract;

pub use document::{
    Info, Operation, ParameterSchema, PathItem, RawParameter, Server, SpecDocument, SpecFormat,
};
pub use extract::{extract_endpoints, ExtractedEndpoint, Extraction};
