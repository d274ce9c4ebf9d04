//! # Integration Tests for gatecheck-axum
//!
//! Drives guarded routers with `tower::ServiceExt::oneshot`: the demo
//! routes, segment ordering, request rewriting, signed cookies, request
//! context references and the error channel.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::RawQuery;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};
use gatecheck_axum::config::DemoConfig;
use gatecheck_axum::{errors, guard, handle_error, SegmentGuardLayer, Validated};
use gatecheck_core::{CheckOptions, Segment, ValidationOptions};
use gatecheck_schema::{load_bundle, JsonSchemaEngine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::{ServiceBuilder, ServiceExt};

/// Helper: the demo app with default configuration and no echo route.
fn demo_app() -> Router {
    gatecheck_axum::demo::router(
        Arc::new(JsonSchemaEngine::new()),
        &DemoConfig::default(),
        None,
    )
    .unwrap()
}

/// Helper: a guard layer for a bundle document given as JSON.
fn layer_for(bundle: Value) -> SegmentGuardLayer<JsonSchemaEngine> {
    let engine = Arc::new(JsonSchemaEngine::new());
    let compiled = engine.compile_bundle(&bundle).unwrap();
    guard(engine, compiled)
}

/// Helper: a one-route router guarded by `layer`, echoing validated segments.
fn echo_router(path: &str, layer: SegmentGuardLayer<JsonSchemaEngine>) -> Router {
    Router::new().route(
        path,
        post(|v: Validated| async move { axum::Json(v.to_json()) }).layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(layer),
        ),
    )
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn signed_cookie_pair(key: &Key, name: &str, value: &str) -> String {
    let response = SignedCookieJar::new(key.clone())
        .add(Cookie::new(name.to_string(), value.to_string()))
        .into_response();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

// -- Demo Routes --------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = demo_app()
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_missing_body_field_is_rejected_with_body_segment() {
    let response = demo_app().oneshot(json_post("/users", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["segment"], "body");
    assert!(body["error"]["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_valid_body_reaches_handler() {
    let response = demo_app()
        .oneshot(json_post("/users", r#"{"name":"ada"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"name": "ada"}));
}

#[tokio::test]
async fn test_query_page_is_converted_to_number() {
    let response = demo_app()
        .oneshot(
            Request::builder()
                .uri("/items?page=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"], json!(5));
    assert!(body["page"].is_number());
}

#[tokio::test]
async fn test_non_numeric_page_is_rejected() {
    let response = demo_app()
        .oneshot(
            Request::builder()
                .uri("/items?page=five")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["details"]["segment"], "query");
}

#[tokio::test]
async fn test_path_params_are_validated() {
    let ok = demo_app()
        .oneshot(Request::builder().uri("/users/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await, json!({"id": 7}));

    let bad = demo_app()
        .oneshot(Request::builder().uri("/users/seven").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad).await["error"]["details"]["segment"], "params");
}

#[tokio::test]
async fn test_echo_route_uses_bundle_document() {
    let mut doc = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    doc.write_all(
        b"params:\n  type: object\n  properties:\n    id: { type: integer }\nheaders:\n  type: object\n  required: [x-api-key]\n",
    )
    .unwrap();

    let engine = Arc::new(JsonSchemaEngine::new());
    let bundle = load_bundle(&engine, doc.path()).unwrap();
    let app = gatecheck_axum::demo::router(engine, &DemoConfig::default(), Some(bundle)).unwrap();

    let mut req = json_post("/echo/12", "{}");
    req.headers_mut()
        .insert("x-api-key", "secret".parse().unwrap());
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["params"], json!({"id": 12}));
    assert_eq!(body["headers"]["x-api-key"], "secret");

    let response = app.oneshot(json_post("/echo/12", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["details"]["segment"], "headers");
}

// -- Ordering & Pass-through --------------------------------------------------

#[tokio::test]
async fn test_first_failing_segment_wins_and_handler_is_skipped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let layer = layer_for(json!({
        "headers": {"type": "object", "required": ["x-api-key"]},
        "query": {"type": "object", "required": ["page"]},
        "body": {"type": "object", "required": ["name"]}
    }));
    let app = Router::new().route(
        "/things",
        post(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "handled"
            }
        })
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(layer),
        ),
    );

    let response = app.oneshot(json_post("/things", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["details"]["segment"], "headers");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_bundle_passes_request_through() {
    let layer = layer_for(json!({}));
    let app = Router::new().route(
        "/raw",
        get(|RawQuery(q): RawQuery| async move { q.unwrap_or_default() }).layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(layer),
        ),
    );
    let response = app
        .oneshot(Request::builder().uri("/raw?a=1&a=2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "a=1&a=2");
}

fn undecodable_param_router(layer: SegmentGuardLayer<JsonSchemaEngine>) -> Router {
    Router::new().route(
        "/x/{id}",
        get(|| async { "handled" }).layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(layer),
        ),
    )
}

#[tokio::test]
async fn test_undecodable_param_ignored_when_params_not_declared() {
    for bundle in [json!({}), json!({"query": {"type": "object"}})] {
        let response = undecodable_param_router(layer_for(bundle))
            .oneshot(Request::builder().uri("/x/%FF").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "handled");
    }
}

#[tokio::test]
async fn test_undecodable_param_rejected_when_params_declared() {
    let layer = layer_for(json!({"params": {"type": "object"}}));
    let response = undecodable_param_router(layer)
        .oneshot(Request::builder().uri("/x/%FF").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

// -- Request Rewriting --------------------------------------------------------

#[tokio::test]
async fn test_query_string_is_rewritten_from_validated_values() {
    let layer = layer_for(json!({
        "query": {"type": "object", "properties": {"page": {"type": "integer"}}}
    }));
    let app = Router::new().route(
        "/raw",
        get(|RawQuery(q): RawQuery| async move { q.unwrap_or_default() }).layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(layer.with_options(ValidationOptions::default().strip_unknown(true))),
        ),
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/raw?page=05&debug=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_string(response).await, "page=5");
}

#[tokio::test]
async fn test_form_body_is_rewritten_with_new_length() {
    let layer = layer_for(json!({
        "body": {
            "type": "object",
            "properties": {"age": {"type": "integer"}},
            "required": ["age"]
        }
    }))
    .with_options(ValidationOptions::default().strip_unknown(true));
    let app = Router::new().route(
        "/form",
        post(|headers: axum::http::HeaderMap, body: String| async move {
            let len = headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            format!("{len}:{body}")
        })
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_error))
                .layer(layer),
        ),
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("age=30&admin=true"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "6:age=30");
}

// -- Cookies ------------------------------------------------------------------

#[tokio::test]
async fn test_signed_cookies_require_valid_signature() {
    let key = Key::from(&[42u8; 64][..]);
    let layer = layer_for(json!({
        "signed_cookies": {"type": "object", "required": ["session"]}
    }))
    .with_cookie_key(key.clone());
    let app = echo_router("/me", layer);

    let good = format!("{}; theme=dark", signed_cookie_pair(&key, "session", "u-1"));
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/me")
                .header(header::COOKIE, good)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"signed_cookies": {"session": "u-1"}})
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/me")
                .header(header::COOKIE, "session=u-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["details"]["segment"],
        "signed_cookies"
    );
}

#[tokio::test]
async fn test_plain_cookies_are_validated() {
    let layer = layer_for(json!({
        "cookies": {
            "type": "object",
            "properties": {"theme": {"enum": ["dark", "light"]}}
        }
    }));
    let app = echo_router("/prefs", layer);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/prefs")
                .header(header::COOKIE, "theme=neon")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["details"]["segment"], "cookies");
}

// -- Request Context ----------------------------------------------------------

#[tokio::test]
async fn test_context_reference_against_path_param() {
    let bundle = json!({
        "body": {
            "type": "object",
            "properties": {"owner": {"type": "integer"}},
            "x-context": {"/owner": "/params/id"}
        }
    });
    let with_context =
        echo_router("/owners/{id}", layer_for(bundle.clone()).with_check_options(CheckOptions::with_req_context()));

    let response = with_context
        .clone()
        .oneshot(json_post("/owners/3", r#"{"owner":3}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["body"], json!({"owner": 3}));

    let response = with_context
        .oneshot(json_post("/owners/3", r#"{"owner":4}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Without req_context the reference cannot resolve.
    let without_context = echo_router("/owners/{id}", layer_for(bundle));
    let response = without_context
        .oneshot(json_post("/owners/3", r#"{"owner":3}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Error Channel ------------------------------------------------------------

#[tokio::test]
async fn test_malformed_json_is_bad_request_not_validation() {
    let app = echo_router("/users", layer_for(json!({"body": {"type": "object"}})));
    let response = app.oneshot(json_post("/users", r#"{"name":"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unsupported_media_type() {
    let app = echo_router("/users", layer_for(json!({"body": {"type": "object"}})));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_body_over_limit() {
    let layer = layer_for(json!({"body": {"type": "object"}})).with_body_limit(16);
    let app = echo_router("/users", layer);
    let response = app
        .oneshot(json_post("/users", r#"{"name":"a very long name indeed"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_custom_formatter_status() {
    let layer = layer_for(json!({"body": {"type": "object", "required": ["name"]}}));
    let app = Router::new().route(
        "/users",
        post(|| async { "created" }).layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(
                    errors()
                        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                        .handler(),
                ))
                .layer(layer),
        ),
    );
    let response = app.oneshot(json_post("/users", "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_guard_error_is_recognized_by_classifier() {
    let layer = layer_for(json!({"query": {"type": "object", "required": ["q"]}}));
    let svc = ServiceBuilder::new()
        .layer(layer)
        .service_fn(|_req: Request<Body>| async {
            Ok::<_, std::convert::Infallible>(axum::response::Response::new(Body::empty()))
        });
    let err = svc
        .oneshot(Request::builder().uri("/search").body(Body::empty()).unwrap())
        .await
        .unwrap_err();
    assert!(gatecheck_axum::is_segment_error(&*err));
    let failure = err.downcast::<gatecheck_axum::SegmentError>().unwrap();
    assert_eq!(failure.segment(), Segment::Query);
    assert_eq!(failure.meta.segment, Segment::Query);
}
