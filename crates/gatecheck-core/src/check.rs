//! # Validation Pass
//!
//! Runs the engine over every declared segment of one request.
//!
//! ## Invariants
//!
//! - Segments are visited in [`Segment::ORDER`]; the first failure ends
//!   the pass and is the only one reported.
//! - All-or-nothing: outputs are returned only when every declared
//!   segment passed. A failure discards the outputs of segments that
//!   passed before it.
//! - An empty bundle always passes with no outputs.

use crate::bundle::SchemaBundle;
use crate::engine::SchemaEngine;
use crate::error::SegmentError;
use crate::options::{CheckOptions, ValidationOptions};
use crate::request::{RequestSegments, ValidatedSegments};
use crate::segment::Segment;

/// Validate `request` against `bundle`.
///
/// # Errors
///
/// Returns the [`SegmentError`] of the first declared segment, in
/// [`Segment::ORDER`], that the engine rejects.
pub fn check_segments<E: SchemaEngine>(
    engine: &E,
    bundle: &SchemaBundle<E::Schema>,
    request: &RequestSegments,
    options: &ValidationOptions,
    check: &CheckOptions,
) -> Result<ValidatedSegments, SegmentError> {
    let context = check.req_context.then(|| request.to_context());
    let mut validated = ValidatedSegments::new();

    for (segment, schema) in bundle.declared() {
        let value = request.get(segment);
        match engine.validate(schema, value, options, context.as_ref()) {
            Ok(output) => {
                tracing::debug!(%segment, "segment passed validation");
                validated.insert(segment, output);
            }
            Err(report) => {
                tracing::debug!(
                    %segment,
                    violations = report.len(),
                    "segment failed validation"
                );
                return Err(SegmentError::new(report, segment));
            }
        }
    }

    Ok(validated)
}

/// The segment a pass over `failing` would report: the first declared
/// segment in validation order.
pub fn first_reported(failing: &[Segment]) -> Option<Segment> {
    failing.iter().copied().min_by_key(Segment::position)
}
