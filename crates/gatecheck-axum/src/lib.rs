//! # gatecheck-axum - Request Segment Validation for Axum
//!
//! Wraps individual routes in a Tower layer that validates request
//! segments (path parameters, headers, query, cookies, signed cookies,
//! body) against a per-route schema bundle before the handler runs.
//!
//! ## Modules
//!
//! - [`guard`](mod@guard) - [`SegmentGuardLayer`] and the [`guard`](fn@guard) constructor.
//! - [`extract`] - request snapshots and rewriting.
//! - [`formatter`] - [`ErrorFormatter`], [`errors`] and [`handle_error`].
//! - [`extractors`] - the [`Validated`] extractor.
//! - [`error`] - [`AppError`] and [`RequestReadError`].
//! - [`config`], [`demo`] - the `gatecheck-demo` server.
//!
//! ## Request Flow
//!
//! ```text
//! TraceLayer → HandleErrorLayer → SegmentGuard → Handler
//! ```
//!
//! A failed segment never reaches the handler; the guard's error goes to
//! `HandleErrorLayer`, which answers with `400 VALIDATION_ERROR` by default.

pub mod config;
pub mod demo;
pub mod error;
pub mod extract;
pub mod extractors;
pub mod formatter;
pub mod guard;

pub use error::{AppError, ErrorBody, ErrorDetail, RequestReadError};
pub use extractors::Validated;
pub use formatter::{errors, handle_error, ErrorFormatter};
pub use guard::{guard, SegmentGuard, SegmentGuardLayer, DEFAULT_BODY_LIMIT};

pub use gatecheck_core::{is_segment_error, BoxError, GuardError, SegmentError};
