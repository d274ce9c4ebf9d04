//! # Validated Segments Extractor
//!
//! Handlers behind a guard read the engine's output for every validated
//! segment through [`Validated`]. Path parameters, headers and cookies
//! are not rewritten in place, so this is the only way to see their
//! coerced values.

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gatecheck_core::{Segment, ValidatedSegments};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// The [`ValidatedSegments`] attached by the guard.
///
/// Extracting it on a route without a guard is a wiring mistake and
/// answers 500.
#[derive(Debug, Clone)]
pub struct Validated(pub ValidatedSegments);

impl Validated {
    /// Deserialize one validated segment.
    ///
    /// # Errors
    ///
    /// [`AppError::BadRequest`] when the segment was not validated on this
    /// route or does not fit `T`.
    pub fn segment<T: DeserializeOwned>(&self, segment: Segment) -> Result<T, AppError> {
        self.0
            .deserialize(segment)
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .ok_or_else(|| AppError::BadRequest(format!("{segment} was not validated")))
    }
}

impl Deref for Validated {
    type Target = ValidatedSegments;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Validated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ValidatedSegments>()
            .cloned()
            .map(Validated)
            .ok_or_else(|| AppError::Internal("route has no segment guard".to_string()))
    }
}
