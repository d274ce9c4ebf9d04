//! # Options
//!
//! [`ValidationOptions`] are forwarded verbatim to the engine on every
//! call; this crate enforces nothing about them. [`CheckOptions`] control
//! the validation pass itself.

use serde::{Deserialize, Serialize};

/// Engine options, forwarded unchanged with every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationOptions {
    /// Stop at the first violation instead of collecting all of them.
    pub abort_early: bool,
    /// Coerce string input to the types the schema declares.
    pub convert: bool,
    /// Drop object keys the schema does not declare.
    pub strip_unknown: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            abort_early: true,
            convert: true,
            strip_unknown: false,
        }
    }
}

impl ValidationOptions {
    /// Set `abort_early`.
    pub fn abort_early(mut self, value: bool) -> Self {
        self.abort_early = value;
        self
    }

    /// Set `convert`.
    pub fn convert(mut self, value: bool) -> Self {
        self.convert = value;
        self
    }

    /// Set `strip_unknown`.
    pub fn strip_unknown(mut self, value: bool) -> Self {
        self.strip_unknown = value;
        self
    }
}

/// Options for the validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Pass the whole request snapshot to the engine as validation context.
    pub req_context: bool,
}

impl CheckOptions {
    /// Options with `req_context` enabled.
    pub fn with_req_context() -> Self {
        Self { req_context: true }
    }
}
