//! # Schema Engine Trait
//!
//! Defines the interface to the external validation library. The
//! validation pass never names a concrete engine: it is handed one
//! explicitly and only ever calls [`SchemaEngine::validate`].
//!
//! Schemas are compiled and owned by whoever builds the bundle; the
//! engine only reads them.

use serde_json::Value;

use crate::options::ValidationOptions;
use crate::report::ValidationReport;

/// Abstract interface for a schema validation engine.
///
/// Implementations must be `Send + Sync`: one engine instance is shared
/// by every request a route serves. Validation is a pure function of its
/// arguments.
pub trait SchemaEngine: Send + Sync + 'static {
    /// The compiled schema type stored in a bundle.
    type Schema: Send + Sync + 'static;

    /// Validate `value` against `schema`.
    ///
    /// On success returns the engine's output for the value, which may
    /// differ from the input when the options ask for coercion or
    /// stripping. `context` is the request snapshot when the pass runs
    /// with `req_context`, `None` otherwise.
    fn validate(
        &self,
        schema: &Self::Schema,
        value: &Value,
        options: &ValidationOptions,
        context: Option<&Value>,
    ) -> Result<Value, ValidationReport>;
}
