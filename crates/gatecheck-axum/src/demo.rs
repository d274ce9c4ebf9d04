//! # Demo Application
//!
//! A small router showing guarded routes end to end.
//!
//! | Route                    | Guarded segments                        |
//! |--------------------------|-----------------------------------------|
//! | `POST /users`            | body: `name` (string) required          |
//! | `GET /items`             | query: `page` (number) required         |
//! | `GET /users/{id}`        | params: `id` (integer)                  |
//! | `POST /echo/{id}`        | whatever `GATECHECK_BUNDLE` declares    |
//! | `GET /health/liveness`   | none                                    |

use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gatecheck_core::{SchemaBundle, Segment};
use gatecheck_schema::{load_bundle, JsonSchemaEngine, SchemaError, SegmentSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::DemoConfig;
use crate::extractors::Validated;
use crate::formatter::handle_error;
use crate::guard::{guard, SegmentGuardLayer, DEFAULT_BODY_LIMIT};

/// Build the demo application, loading the echo bundle if configured.
///
/// # Errors
///
/// [`SchemaError`] when the echo bundle document cannot be loaded.
pub fn app(config: &DemoConfig) -> Result<Router, SchemaError> {
    let engine = Arc::new(JsonSchemaEngine::new());
    let echo = config
        .bundle_path
        .as_deref()
        .map(|path| load_bundle(&engine, path))
        .transpose()?;
    router(engine, config, echo)
}

/// Build the demo router with an explicit engine and echo bundle.
///
/// # Errors
///
/// [`SchemaError`] if a built-in schema fails to compile.
pub fn router(
    engine: Arc<JsonSchemaEngine>,
    config: &DemoConfig,
    echo: Option<SchemaBundle<SegmentSchema>>,
) -> Result<Router, SchemaError> {
    let guard_for = |bundle: SchemaBundle<SegmentSchema>| -> SegmentGuardLayer<JsonSchemaEngine> {
        let layer = guard(Arc::clone(&engine), bundle)
            .with_options(config.options)
            .with_check_options(config.check)
            .with_body_limit(DEFAULT_BODY_LIMIT);
        match &config.cookie_key {
            Some(key) => layer.with_cookie_key(key.clone()),
            None => layer,
        }
    };

    let users = engine.compile_bundle(&json!({
        "body": {
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        }
    }))?;
    let items = engine.compile_bundle(&json!({
        "query": {
            "type": "object",
            "properties": {"page": {"type": "number"}},
            "required": ["page"]
        }
    }))?;
    let user = engine.compile_bundle(&json!({
        "params": {
            "type": "object",
            "properties": {"id": {"type": "integer"}},
            "required": ["id"]
        }
    }))?;

    let mut api = Router::new()
        .route(
            "/users",
            post(create_user).layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_error))
                    .layer(guard_for(users)),
            ),
        )
        .route(
            "/items",
            get(list_items).layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_error))
                    .layer(guard_for(items)),
            ),
        )
        .route(
            "/users/{id}",
            get(get_user).layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_error))
                    .layer(guard_for(user)),
            ),
        );

    if let Some(bundle) = echo {
        api = api.route(
            "/echo/{id}",
            post(echo_segments).layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_error))
                    .layer(guard_for(bundle)),
            ),
        );
    }

    let health = Router::new().route("/health/liveness", get(liveness));

    Ok(Router::new()
        .merge(health)
        .merge(api)
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(TraceLayer::new_for_http()))
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
}

async fn create_user(Json(user): Json<NewUser>) -> (StatusCode, Json<Value>) {
    tracing::info!(name = %user.name, "user created");
    (StatusCode::CREATED, Json(json!({"name": user.name})))
}

async fn list_items(validated: Validated) -> Json<Value> {
    let page = validated
        .get(Segment::Query)
        .and_then(|q| q.get("page"))
        .cloned()
        .unwrap_or(Value::Null);
    Json(json!({"page": page, "items": []}))
}

async fn get_user(validated: Validated) -> Json<Value> {
    let id = validated
        .get(Segment::Params)
        .and_then(|p| p.get("id"))
        .cloned()
        .unwrap_or(Value::Null);
    Json(json!({"id": id}))
}

async fn echo_segments(validated: Validated) -> Json<Value> {
    Json(validated.to_json())
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}
