//! # JSON Schema Engine
//!
//! [`SchemaEngine`] implementation backed by the `jsonschema` crate
//! (Draft 2020-12 unless configured otherwise).
//!
//! ## Pipeline
//!
//! For every segment value:
//!
//! 1. coerce string input to declared types (`convert`),
//! 2. drop undeclared keys (`strip_unknown`),
//! 3. run the compiled validator (first error only with `abort_early`),
//! 4. check `x-context` references against the request context.
//!
//! The value after steps 1 and 2 is the segment output.
//!
//! ## Schema Resolution
//!
//! `$ref`s resolve against resources registered with
//! [`JsonSchemaEngine::with_resource`]. Nothing is fetched over the
//! network or from disk; an unregistered URI fails at compile time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gatecheck_core::{
    CoreError, SchemaBundle, SchemaEngine, Segment, ValidationOptions, ValidationReport, Violation,
};
use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::coerce::{coerce, strip_unknown};
use crate::context::{check_refs, parse_refs, ContextRef};

/// Errors raised while compiling schemas or loading bundle documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema is not a valid JSON Schema.
    #[error("schema build error for {segment}: {reason}")]
    SchemaBuild {
        /// Segment the schema was declared for, or `schema` when compiled directly.
        segment: String,
        /// Validator build failure.
        reason: String,
    },

    /// An `x-context` entry is malformed.
    #[error("invalid context reference '{pointer}': {reason}")]
    InvalidContextRef {
        /// Offending pointer or keyword.
        pointer: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A bundle document could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path to the document.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// A bundle document is not a mapping of segment names to schemas.
    #[error("bundle document must be an object keyed by segment name")]
    NotAnObject,

    /// A bundle document names a segment that does not exist.
    #[error(transparent)]
    UnknownSegment(#[from] CoreError),
}

/// A compiled schema for one segment.
pub struct SegmentSchema {
    raw: Value,
    validator: Validator,
    context_refs: Vec<ContextRef>,
}

impl SegmentSchema {
    /// Context references declared by the schema.
    pub fn context_refs(&self) -> &[ContextRef] {
        &self.context_refs
    }
}

impl fmt::Debug for SegmentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentSchema")
            .field("raw", &self.raw)
            .field("context_refs", &self.context_refs)
            .finish_non_exhaustive()
    }
}

/// Resolves `$ref` URIs from resources registered on the engine.
struct LocalRetriever {
    resources: Arc<HashMap<String, Value>>,
}

impl Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.resources
            .get(uri_str)
            .cloned()
            .ok_or_else(|| format!("schema '{uri_str}' is not registered").into())
    }
}

/// `jsonschema`-backed engine.
///
/// Compile schemas once with [`compile`](Self::compile) or
/// [`compile_bundle`](Self::compile_bundle) and share the engine behind
/// an `Arc`; it holds no per-request state.
#[derive(Debug, Clone)]
pub struct JsonSchemaEngine {
    draft: Draft,
    resources: Arc<HashMap<String, Value>>,
}

impl Default for JsonSchemaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchemaEngine {
    /// Engine using Draft 2020-12.
    pub fn new() -> Self {
        Self {
            draft: Draft::Draft202012,
            resources: Arc::new(HashMap::new()),
        }
    }

    /// Use a different draft for schemas without `$schema`.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    /// Register a schema `$ref`s can point at by `uri`.
    pub fn with_resource(mut self, uri: impl Into<String>, schema: Value) -> Self {
        Arc::make_mut(&mut self.resources).insert(uri.into(), schema);
        self
    }

    /// Compile one schema.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaBuild`] for invalid schemas,
    /// [`SchemaError::InvalidContextRef`] for malformed `x-context`.
    pub fn compile(&self, schema: Value) -> Result<SegmentSchema, SchemaError> {
        self.compile_named("schema", schema)
    }

    /// Compile a `{ "<segment>": <schema> }` object into a bundle.
    ///
    /// # Errors
    ///
    /// Fails on non-object input, unknown segment names, or any schema
    /// that does not compile.
    pub fn compile_bundle(&self, doc: &Value) -> Result<SchemaBundle<SegmentSchema>, SchemaError> {
        let Value::Object(entries) = doc else {
            return Err(SchemaError::NotAnObject);
        };
        let mut bundle = SchemaBundle::new();
        for (name, schema) in entries {
            let segment: Segment = name.parse()?;
            let compiled = self.compile_named(segment.as_str(), schema.clone())?;
            bundle.set(segment, compiled);
        }
        tracing::debug!(
            segments = bundle.declared().count(),
            "compiled schema bundle"
        );
        Ok(bundle)
    }

    fn compile_named(&self, segment: &str, schema: Value) -> Result<SegmentSchema, SchemaError> {
        let context_refs = parse_refs(&schema)?;

        let mut opts = jsonschema::options();
        opts.with_draft(self.draft);
        opts.with_retriever(LocalRetriever {
            resources: Arc::clone(&self.resources),
        });
        let validator = opts.build(&schema).map_err(|e| SchemaError::SchemaBuild {
            segment: segment.to_string(),
            reason: e.to_string(),
        })?;

        Ok(SegmentSchema {
            raw: schema,
            validator,
            context_refs,
        })
    }
}

impl SchemaEngine for JsonSchemaEngine {
    type Schema = SegmentSchema;

    fn validate(
        &self,
        schema: &SegmentSchema,
        value: &Value,
        options: &ValidationOptions,
        context: Option<&Value>,
    ) -> Result<Value, ValidationReport> {
        let mut value = if options.convert {
            coerce(&schema.raw, value.clone())
        } else {
            value.clone()
        };
        if options.strip_unknown {
            strip_unknown(&schema.raw, &mut value);
        }

        let limit = if options.abort_early { 1 } else { usize::MAX };
        let mut report: ValidationReport = schema
            .validator
            .iter_errors(&value)
            .take(limit)
            .map(|e| {
                Violation::new(
                    e.instance_path.to_string(),
                    e.schema_path.to_string(),
                    e.to_string(),
                )
            })
            .collect::<Vec<_>>()
            .into();

        let remaining = limit.saturating_sub(report.len());
        for violation in check_refs(&schema.context_refs, &value, context)
            .into_iter()
            .take(remaining)
        {
            report.push(violation);
        }

        if report.is_empty() {
            Ok(value)
        } else {
            Err(report)
        }
    }
}
