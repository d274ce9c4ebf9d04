//! # Request Snapshot
//!
//! [`RequestSegments`] is the framework-independent view of one incoming
//! request that the validation pass reads: each segment as a JSON value
//! plus the method and path. [`ValidatedSegments`] carries the engine's
//! output for every declared segment once the whole pass has succeeded.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::segment::Segment;

/// Segment values of one request.
///
/// Every segment defaults to an empty JSON object, matching a request
/// that carries no parameters, headers, query, cookies or body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSegments {
    /// HTTP method, upper-case.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    values: [Value; 6],
}

impl Default for RequestSegments {
    fn default() -> Self {
        Self::new("GET", "/")
    }
}

impl RequestSegments {
    /// Empty snapshot for `method` and `path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            values: std::array::from_fn(|_| Value::Object(Map::new())),
        }
    }

    /// Set the value of `segment`.
    pub fn with(mut self, segment: Segment, value: Value) -> Self {
        self.set(segment, value);
        self
    }

    /// Set the value of `segment`, returning the previous value.
    pub fn set(&mut self, segment: Segment, value: Value) -> Value {
        std::mem::replace(&mut self.values[segment.position()], value)
    }

    /// The value of `segment`.
    pub fn get(&self, segment: Segment) -> &Value {
        &self.values[segment.position()]
    }

    /// Render the snapshot as the validation context object.
    ///
    /// Keys are `method`, `path` and each segment's [`Segment::as_str`].
    pub fn to_context(&self) -> Value {
        let mut ctx = Map::new();
        ctx.insert("method".to_string(), Value::String(self.method.clone()));
        ctx.insert("path".to_string(), Value::String(self.path.clone()));
        for segment in Segment::ORDER {
            ctx.insert(segment.as_str().to_string(), self.get(segment).clone());
        }
        Value::Object(ctx)
    }
}

/// Engine output for every declared segment of a request that passed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedSegments {
    values: BTreeMap<Segment, Value>,
}

impl ValidatedSegments {
    /// Empty set of outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the output for `segment`.
    pub fn insert(&mut self, segment: Segment, value: Value) {
        self.values.insert(segment, value);
    }

    /// The output for `segment`, if it was declared.
    pub fn get(&self, segment: Segment) -> Option<&Value> {
        self.values.get(&segment)
    }

    /// Deserialize the output for `segment` into `T`.
    ///
    /// Returns `Ok(None)` when the segment was not declared.
    pub fn deserialize<T: DeserializeOwned>(&self, segment: Segment) -> Result<Option<T>, CoreError> {
        self.values
            .get(&segment)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(CoreError::from)
    }

    /// Declared segments, in validation order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.values.keys().copied()
    }

    /// Number of recorded outputs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All outputs as a JSON object keyed by segment name.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(s, v)| (s.as_str().to_string(), v.clone()))
                .collect(),
        )
    }
}
