//! # Segment Guard Layer
//!
//! Tower [`Layer`]/[`Service`] pair that validates a request's declared
//! segments before the wrapped service sees it.
//!
//! A failing segment short-circuits the request: the inner service is not
//! called and the [`SegmentError`](gatecheck_core::SegmentError) comes back
//! as the service error. Axum routes need that error handled, normally
//! with [`HandleErrorLayer`](axum::error_handling::HandleErrorLayer) and
//! [`handle_error`](crate::formatter::handle_error):
//!
//! ```ignore
//! let create = post(create_user).layer(
//!     ServiceBuilder::new()
//!         .layer(HandleErrorLayer::new(handle_error))
//!         .layer(guard(engine.clone(), bundle)),
//! );
//! ```
//!
//! Apply the guard per route (`MethodRouter::layer` or
//! `Router::route_layer`) so path parameters are available.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::Response;
use axum_extra::extract::cookie::Key;
use gatecheck_core::{
    check_segments, BoxError, CheckOptions, SchemaBundle, SchemaEngine, Segment,
    ValidationOptions,
};
use tower::{Layer, Service};

use crate::extract::{self, ExtractOptions};

/// Default body buffering limit (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Build a guard layer for one route.
pub fn guard<E: SchemaEngine>(engine: Arc<E>, bundle: SchemaBundle<E::Schema>) -> SegmentGuardLayer<E> {
    SegmentGuardLayer {
        engine,
        bundle: Arc::new(bundle),
        options: ValidationOptions::default(),
        check: CheckOptions::default(),
        cookie_key: None,
        body_limit: DEFAULT_BODY_LIMIT,
    }
}

/// Layer produced by [`guard`].
pub struct SegmentGuardLayer<E: SchemaEngine> {
    engine: Arc<E>,
    bundle: Arc<SchemaBundle<E::Schema>>,
    options: ValidationOptions,
    check: CheckOptions,
    cookie_key: Option<Key>,
    body_limit: usize,
}

impl<E: SchemaEngine> Clone for SegmentGuardLayer<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            bundle: Arc::clone(&self.bundle),
            options: self.options,
            check: self.check,
            cookie_key: self.cookie_key.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<E: SchemaEngine> std::fmt::Debug for SegmentGuardLayer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentGuardLayer")
            .field(
                "segments",
                &self.bundle.declared().map(|(s, _)| s).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .field("check", &self.check)
            .field("cookie_key", &self.cookie_key.as_ref().map(|_| "[REDACTED]"))
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

impl<E: SchemaEngine> SegmentGuardLayer<E> {
    /// Options forwarded to the engine.
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Adapter options.
    pub fn with_check_options(mut self, check: CheckOptions) -> Self {
        self.check = check;
        self
    }

    /// Key used to verify signed cookies. Without one, `signed_cookies`
    /// is always empty.
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.cookie_key = Some(key);
        self
    }

    /// Maximum body size buffered for validation.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Snapshot, validate and rewrite one request.
    async fn process(&self, req: Request) -> Result<Request, BoxError> {
        let (mut parts, body) = req.into_parts();
        let read = ExtractOptions {
            strict_params: self.bundle.declares(Segment::Params) || self.check.req_context,
            read_body: self.bundle.declares(Segment::Body),
            cookie_key: self.cookie_key.as_ref(),
            body_limit: self.body_limit,
        };

        let extracted = extract::snapshot(&mut parts, body, &read)
            .await
            .map_err(|e| {
                tracing::warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    error = %e,
                    "request could not be read for validation"
                );
                e
            })?;

        match check_segments(
            self.engine.as_ref(),
            &self.bundle,
            &extracted.segments,
            &self.options,
            &self.check,
        ) {
            Ok(validated) => {
                let body = extract::rewrite(&mut parts, extracted, validated)?;
                Ok(Request::from_parts(parts, body))
            }
            Err(err) => {
                tracing::info!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    segment = %err.segment(),
                    "request rejected by validation"
                );
                Err(Box::new(err))
            }
        }
    }
}

impl<S, E: SchemaEngine> Layer<S> for SegmentGuardLayer<E> {
    type Service = SegmentGuard<S, E>;

    fn layer(&self, inner: S) -> Self::Service {
        SegmentGuard {
            inner,
            layer: self.clone(),
        }
    }
}

/// Service produced by [`SegmentGuardLayer`].
pub struct SegmentGuard<S, E: SchemaEngine> {
    inner: S,
    layer: SegmentGuardLayer<E>,
}

impl<S: Clone, E: SchemaEngine> Clone for SegmentGuard<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            layer: self.layer.clone(),
        }
    }
}

impl<S, E> Service<Request> for SegmentGuard<S, E>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    E: SchemaEngine,
{
    type Response = Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Use the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let layer = self.layer.clone();

        Box::pin(async move {
            let req = layer.process(req).await?;
            inner.call(req).await.map_err(Into::into)
        })
    }
}
