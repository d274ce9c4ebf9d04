//! # Error Types
//!
//! The normalized validation error produced by the validation pass and
//! the classifier that lets downstream error handling tell it apart from
//! every other error travelling the same channel.
//!
//! ## Design
//!
//! - A failed segment is a [`SegmentError`]: the engine's report, a
//!   message and the failing segment. Its concrete type is the marker.
//! - [`GuardError`] is the sum type seen by error handlers: either a
//!   segment failure or an opaque external error.
//! - [`is_segment_error`] recognizes segment failures on any
//!   `dyn Error`, including boxed errors from the Tower error channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::ValidationReport;
use crate::segment::Segment;

/// Boxed error used by the Tower error channel.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for gatecheck configuration and parsing.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A segment identifier did not name one of the six segments.
    #[error("unknown request segment: {0:?}")]
    UnknownSegment(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Metadata attached to a [`SegmentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// The segment whose validation failed.
    pub segment: Segment,
}

/// A declared segment failed schema validation.
///
/// Created during a single request's validation pass, forwarded once to
/// the error channel, then dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct SegmentError {
    /// The engine's raw failure detail.
    pub details: ValidationReport,
    /// Human-readable message.
    pub message: String,
    /// Which segment failed.
    pub meta: SegmentMeta,
}

impl SegmentError {
    /// Build the normalized error for `segment` from the engine's report.
    ///
    /// The message is the report summary, or a generic sentence when the
    /// engine returned no violations.
    pub fn new(details: ValidationReport, segment: Segment) -> Self {
        let message = if details.is_empty() {
            format!("request {segment} failed validation")
        } else {
            details.summary()
        };
        Self {
            details,
            message,
            meta: SegmentMeta { segment },
        }
    }

    /// The segment whose validation failed.
    pub fn segment(&self) -> Segment {
        self.meta.segment
    }
}

/// Error seen by a terminal error handler.
#[derive(Error, Debug)]
pub enum GuardError {
    /// A segment failed validation in the guard.
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// Any other error; never produced by the validation pass.
    #[error(transparent)]
    External(BoxError),
}

impl GuardError {
    /// Sort a boxed error into the segment-failure or external variant.
    ///
    /// Anything [`is_segment_error`] does not recognize, a boxed
    /// `GuardError::External` included, lands in `External` as-is.
    pub fn classify(err: BoxError) -> Self {
        if !is_segment_error(&*err) {
            return Self::External(err);
        }
        match err.downcast::<SegmentError>() {
            Ok(segment) => Self::Segment(*segment),
            Err(other) => match other.downcast::<GuardError>() {
                Ok(guard) => *guard,
                Err(other) => Self::External(other),
            },
        }
    }

    /// True for the segment-failure variant.
    pub fn is_segment(&self) -> bool {
        matches!(self, Self::Segment(_))
    }

    /// The segment failure, if this is one.
    pub fn as_segment(&self) -> Option<&SegmentError> {
        match self {
            Self::Segment(e) => Some(e),
            Self::External(_) => None,
        }
    }

    /// Box the error back up, unwrapping the external variant so that the
    /// original error comes back out unchanged.
    pub fn into_boxed(self) -> BoxError {
        match self {
            Self::Segment(e) => Box::new(e),
            Self::External(e) => e,
        }
    }
}

/// Returns true iff `err` was produced by the validation pass.
pub fn is_segment_error(err: &(dyn std::error::Error + 'static)) -> bool {
    if err.is::<SegmentError>() {
        return true;
    }
    matches!(err.downcast_ref::<GuardError>(), Some(GuardError::Segment(_)))
}
