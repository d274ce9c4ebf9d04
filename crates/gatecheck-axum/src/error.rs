//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Validation failures carry their details to the client; 5xx responses
//! never expose internal error text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Failure to turn the raw request into segment values.
///
/// These travel the guard's error channel like validation failures but
/// are not recognized by the classifier.
#[derive(Error, Debug)]
pub enum RequestReadError {
    /// Body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Body could not be parsed as its declared content type.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Body content type is neither JSON nor urlencoded form.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Path parameters could not be decoded.
    #[error("malformed path parameters: {0}")]
    MalformedPath(String),

    /// Transport failure while reading the body.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// The validated values could not be written back into the request.
    #[error("failed to rewrite request: {0}")]
    Rewrite(String),
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// A request segment failed validation.
    #[error("{message}")]
    Validation {
        status: StatusCode,
        message: String,
        details: serde_json::Value,
    },

    /// Request could not be read (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body over the limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Body content type not accepted (415).
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { status, .. } => (*status, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let (message, details) = match self {
            Self::Validation {
                message, details, ..
            } => (message, Some(details)),
            Self::Internal(_) => ("An internal error occurred".to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RequestReadError> for AppError {
    fn from(err: RequestReadError) -> Self {
        match &err {
            RequestReadError::BodyTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            RequestReadError::UnsupportedMediaType(_) => Self::UnsupportedMediaType(err.to_string()),
            RequestReadError::MalformedBody(_)
            | RequestReadError::MalformedPath(_)
            | RequestReadError::Body(_) => Self::BadRequest(err.to_string()),
            RequestReadError::Rewrite(_) => Self::Internal(err.to_string()),
        }
    }
}
