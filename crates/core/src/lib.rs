//! Endpoint collections, parameter binding, and smart resolution
//!
//! This crate owns the addressable endpoint registry
//! ([`EndpointCollection`]), the binding step that merges endpoint defaults,
//! collection-level shared parameters, and caller input into a
//! [`BoundRequest`], and the smart resolver that maps a free-text request
//! onto one endpoint through a pluggable [`ModelService`].
//!
//! The collection is not internally synchronized. It is designed for one
//! single-threaded script or request context; callers sharing a collection
//! across threads must serialize mutation themselves.

mod bind;
mod collection;
mod resolver;

pub use apibind_common::{ApiBindError, Diagnostic, Endpoint, HttpMethod, ParamSpec, Result};
pub use bind::{bind, Binding, BoundRequest, CallerInput};
pub use collection::EndpointCollection;
pub use resolver::{build_catalogue, CatalogueEntry, CatalogueParam, ModelService};
