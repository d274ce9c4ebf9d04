//! # gatecheck-core - Segments, Bundles & the Validation Pass
//!
//! Framework-independent building blocks of the gatecheck request
//! validation middleware.
//!
//! ## Modules
//!
//! - [`segment`] - the six request segments and their validation order.
//! - [`bundle`] - per-route schema bundles.
//! - [`options`] - engine options and pass options.
//! - [`request`] - request snapshots and validated outputs.
//! - [`report`] - engine failure detail.
//! - [`error`] - the normalized segment error and its classifier.
//! - [`engine`] - the trait the external validator implements.
//! - [`check`] - the validation pass itself.
//!
//! ## Crate Policy
//!
//! - No HTTP framework types here; adapters live in `gatecheck-axum`.
//! - No concrete validator here; engines live in `gatecheck-schema`.
//! - The engine is always passed in explicitly.

pub mod bundle;
pub mod check;
pub mod engine;
pub mod error;
pub mod options;
pub mod report;
pub mod request;
pub mod segment;

pub use bundle::SchemaBundle;
pub use check::{check_segments, first_reported};
pub use engine::SchemaEngine;
pub use error::{is_segment_error, BoxError, CoreError, GuardError, SegmentError, SegmentMeta};
pub use options::{CheckOptions, ValidationOptions};
pub use report::{ValidationReport, Violation};
pub use request::{RequestSegments, ValidatedSegments};
pub use segment::{Segment, SEGMENT_COUNT};
