//! # gatecheck-schema - JSON Schema Engine
//!
//! The [`SchemaEngine`](gatecheck_core::SchemaEngine) implementation used
//! by gatecheck routes, backed by the `jsonschema` crate.
//!
//! ## Modules
//!
//! - [`validate`] - [`JsonSchemaEngine`], compiled [`SegmentSchema`]s and
//!   the validation pipeline.
//! - [`coerce`] - string-to-type coercion and unknown-key stripping.
//! - [`context`] - `x-context` references into the request context.
//! - [`document`] - JSON/YAML bundle documents.
//!
//! ## Crate Policy
//!
//! - Depends only on `gatecheck-core` internally.
//! - Schemas are compiled once, at route registration. Validation never
//!   compiles or fetches anything.

pub mod coerce;
pub mod context;
pub mod document;
pub mod validate;

pub use context::{ContextRef, CONTEXT_KEYWORD};
pub use document::{load_bundle, read_document};
pub use jsonschema::Draft;
pub use validate::{JsonSchemaEngine, SchemaError, SegmentSchema};
