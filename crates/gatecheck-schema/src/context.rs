//! # Context References
//!
//! JSON Schema has no notion of a validation context, so cross-segment
//! rules are declared with an extension keyword that the validator
//! ignores:
//!
//! ```json
//! { "type": "object", "x-context": { "/user_id": "/params/id" } }
//! ```
//!
//! Each entry maps a JSON Pointer into the segment value to a JSON
//! Pointer into the request context. When the field is present, the
//! context must resolve the pointer to an equal value. Without a context
//! the reference cannot resolve and the field is rejected.

use gatecheck_core::Violation;
use serde_json::Value;

use crate::validate::SchemaError;

/// Keyword carrying context references.
pub const CONTEXT_KEYWORD: &str = "x-context";

/// One `field -> context pointer` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRef {
    /// Pointer into the segment value.
    pub field: String,
    /// Pointer into the request context.
    pub pointer: String,
}

/// Read the context references declared at the root of `schema`.
pub fn parse_refs(schema: &Value) -> Result<Vec<ContextRef>, SchemaError> {
    let Some(raw) = schema.get(CONTEXT_KEYWORD) else {
        return Ok(Vec::new());
    };
    let Value::Object(entries) = raw else {
        return Err(SchemaError::InvalidContextRef {
            pointer: CONTEXT_KEYWORD.to_string(),
            reason: "expected an object of JSON Pointer pairs".to_string(),
        });
    };

    let mut refs = Vec::with_capacity(entries.len());
    for (field, target) in entries {
        let Value::String(pointer) = target else {
            return Err(SchemaError::InvalidContextRef {
                pointer: field.clone(),
                reason: "context pointer must be a string".to_string(),
            });
        };
        for p in [field.as_str(), pointer.as_str()] {
            if !p.is_empty() && !p.starts_with('/') {
                return Err(SchemaError::InvalidContextRef {
                    pointer: p.to_string(),
                    reason: "JSON Pointer must be empty or start with '/'".to_string(),
                });
            }
        }
        refs.push(ContextRef {
            field: field.clone(),
            pointer: pointer.clone(),
        });
    }
    Ok(refs)
}

/// Check `value` against `refs`, returning one violation per failed rule.
pub fn check_refs(refs: &[ContextRef], value: &Value, context: Option<&Value>) -> Vec<Violation> {
    let schema_path = format!("/{CONTEXT_KEYWORD}");
    let mut violations = Vec::new();

    for r in refs {
        let Some(actual) = value.pointer(&r.field) else {
            continue;
        };
        match context.and_then(|ctx| ctx.pointer(&r.pointer)) {
            Some(expected) if loosely_equal(actual, expected) => {}
            Some(expected) => violations.push(Violation::new(
                r.field.clone(),
                schema_path.clone(),
                format!("{actual} does not match context value {expected} at {}", r.pointer),
            )),
            None => violations.push(Violation::new(
                r.field.clone(),
                schema_path.clone(),
                format!("context reference {} is not available", r.pointer),
            )),
        }
    }

    violations
}

/// Equal JSON, or scalars with the same string rendering.
///
/// Path parameters and headers are strings while bodies carry typed
/// values, so `"7"` matches `7`.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (scalar_text(a), scalar_text(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
