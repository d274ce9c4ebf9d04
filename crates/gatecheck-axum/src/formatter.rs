//! # Error Formatting
//!
//! Turns guard errors into HTTP responses.
//!
//! [`ErrorFormatter::handle`] only answers segment failures and hands
//! every other error back untouched, so it can sit in front of other
//! error handlers. [`handle_error`] is the terminal version for
//! `HandleErrorLayer`: it also answers request read errors and turns
//! anything else into an opaque 500.

use std::future::{ready, Ready};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatecheck_core::{is_segment_error, BoxError, GuardError, SegmentError};
use serde_json::json;

use crate::error::{AppError, RequestReadError};

/// Formatter with the default settings: `400 Bad Request` and the
/// failure's own message.
pub fn errors() -> ErrorFormatter {
    ErrorFormatter::default()
}

/// Response settings for segment failures.
#[derive(Debug, Clone)]
pub struct ErrorFormatter {
    status: StatusCode,
    message: Option<String>,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: None,
        }
    }
}

impl ErrorFormatter {
    /// Respond with `status` instead of 400.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Replace the failure's message in responses.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Respond to a segment failure; return any other error unchanged.
    ///
    /// # Errors
    ///
    /// Returns `err` itself when it did not come from the guard.
    pub fn handle(&self, err: BoxError) -> Result<Response, BoxError> {
        if !is_segment_error(&*err) {
            return Err(err);
        }
        match GuardError::classify(err) {
            GuardError::Segment(failure) => Ok(self.format(&failure)),
            GuardError::External(other) => Err(other),
        }
    }

    /// The response for one segment failure.
    pub fn format(&self, failure: &SegmentError) -> Response {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| failure.message.clone());
        AppError::Validation {
            status: self.status,
            message,
            details: json!({
                "segment": failure.segment(),
                "keys": failure.details.keys(),
                "violations": failure.details,
            }),
        }
        .into_response()
    }

    /// Terminal handling: segment failures through this formatter, then
    /// the fallbacks of [`handle_error`].
    pub fn respond(&self, err: BoxError) -> Response {
        match self.handle(err) {
            Ok(response) => response,
            Err(other) => fallback(other),
        }
    }

    /// A `HandleErrorLayer` handler using this formatter.
    pub fn handler(self) -> impl Fn(BoxError) -> Ready<Response> + Clone + Send + Sync + 'static {
        move |err| ready(self.respond(err))
    }
}

/// Default terminal error handler for guarded routes.
pub async fn handle_error(err: BoxError) -> Response {
    errors().respond(err)
}

fn fallback(err: BoxError) -> Response {
    match err.downcast::<RequestReadError>() {
        Ok(read) => AppError::from(*read).into_response(),
        Err(other) => AppError::Internal(other.to_string()).into_response(),
    }
}
