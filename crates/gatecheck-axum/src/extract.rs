//! # Segment Extraction & Request Rewriting
//!
//! Turns an `http::Request` into [`RequestSegments`] and, after a
//! successful pass, writes the validated values back.
//!
//! - `params`: Axum's raw path parameters. Empty when the route has none
//!   or the guard runs before routing. Undecodable parameters only fail
//!   the request when `params` is declared or the context is requested.
//! - `headers`: lower-case names, repeated headers joined with `", "`,
//!   non-UTF-8 values skipped.
//! - `query`: urlencoded pairs; a repeated key becomes an array.
//! - `cookies`/`signed_cookies`: from `Cookie` headers. A cookie whose
//!   signature verifies only shows up under `signed_cookies`.
//! - `body`: buffered and parsed only when the bundle declares it.

use std::borrow::Cow;
use std::error::Error as StdError;

use axum::body::{Body, Bytes};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use axum_extra::extract::cookie::{CookieJar, Key, SignedCookieJar};
use gatecheck_core::{RequestSegments, Segment, ValidatedSegments};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::RequestReadError;

/// How the body was encoded, so it can be re-encoded the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    /// Nothing was sent; nothing is written back.
    Empty,
}

/// Snapshot of one request, plus what is needed to rebuild it.
pub struct Extracted {
    pub segments: RequestSegments,
    body: Body,
    body_kind: Option<BodyKind>,
}

/// Snapshot settings taken from the guard layer.
pub struct ExtractOptions<'a> {
    /// Fail on unreadable path parameters instead of treating them as `{}`.
    pub strict_params: bool,
    pub read_body: bool,
    pub cookie_key: Option<&'a Key>,
    pub body_limit: usize,
}

/// Build the segment snapshot for `parts` and `body`.
///
/// # Errors
///
/// [`RequestReadError`] when path parameters or the body cannot be read.
pub async fn snapshot(
    parts: &mut Parts,
    body: Body,
    options: &ExtractOptions<'_>,
) -> Result<Extracted, RequestReadError> {
    let mut segments = RequestSegments::new(parts.method.as_str(), parts.uri.path());

    let params = match path_params(parts).await {
        Ok(params) => params,
        Err(e) if !options.strict_params => {
            tracing::debug!(error = %e, "path parameters unreadable; not declared");
            Value::Object(Map::new())
        }
        Err(e) => return Err(e),
    };
    segments.set(Segment::Params, params);
    segments.set(Segment::Headers, headers_value(&parts.headers));
    segments.set(
        Segment::Query,
        pairs_value(form_urlencoded::parse(
            parts.uri.query().unwrap_or("").as_bytes(),
        )),
    );

    let (cookies, signed) = cookie_values(&parts.headers, options.cookie_key);
    segments.set(Segment::Cookies, cookies);
    segments.set(Segment::SignedCookies, signed);

    if !options.read_body {
        return Ok(Extracted {
            segments,
            body,
            body_kind: None,
        });
    }

    let bytes = read_body(&parts.headers, body, options.body_limit).await?;
    let (value, kind) = parse_body(&parts.headers, &bytes)?;
    segments.set(Segment::Body, value);

    Ok(Extracted {
        segments,
        body: Body::from(bytes),
        body_kind: Some(kind),
    })
}

/// Write validated outputs back into the request.
///
/// The query string and body are replaced with their validated values;
/// every output is attached as a [`ValidatedSegments`] extension.
///
/// # Errors
///
/// [`RequestReadError::Rewrite`] if a rewritten value cannot be encoded.
pub fn rewrite(
    parts: &mut Parts,
    extracted: Extracted,
    validated: ValidatedSegments,
) -> Result<Body, RequestReadError> {
    if let Some(query) = validated.get(Segment::Query) {
        parts.uri = with_query(&parts.uri, &encode_pairs(query))?;
    }

    let body = match (extracted.body_kind, validated.get(Segment::Body)) {
        (Some(BodyKind::Json), Some(value)) => {
            let bytes = serde_json::to_vec(value)
                .map_err(|e| RequestReadError::Rewrite(e.to_string()))?;
            set_content_length(&mut parts.headers, bytes.len());
            Body::from(bytes)
        }
        (Some(BodyKind::Form), Some(value)) => {
            let encoded = encode_pairs(value);
            set_content_length(&mut parts.headers, encoded.len());
            Body::from(encoded)
        }
        _ => extracted.body,
    };

    parts.extensions.insert(validated);
    Ok(body)
}

async fn path_params(parts: &mut Parts) -> Result<Value, RequestReadError> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => Ok(Value::Object(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )),
        Err(RawPathParamsRejection::MissingPathParams(_)) => Ok(Value::Object(Map::new())),
        Err(e) => Err(RequestReadError::MalformedPath(e.body_text())),
    }
}

fn headers_value(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !values.is_empty() {
            map.insert(name.as_str().to_string(), Value::String(values.join(", ")));
        }
    }
    Value::Object(map)
}

fn pairs_value<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(map)
}

fn cookie_values(headers: &HeaderMap, key: Option<&Key>) -> (Value, Value) {
    let mut signed = Map::new();
    if let Some(key) = key {
        let jar = SignedCookieJar::from_headers(headers, key.clone());
        for cookie in jar.iter() {
            signed.insert(
                cookie.name().to_string(),
                Value::String(cookie.value().to_string()),
            );
        }
    }

    let plain = CookieJar::from_headers(headers)
        .iter()
        .filter(|c| !signed.contains_key(c.name()))
        .map(|c| (c.name().to_string(), Value::String(c.value().to_string())))
        .collect();

    (Value::Object(plain), Value::Object(signed))
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, RequestReadError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(RequestReadError::BodyTooLarge { limit });
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            RequestReadError::BodyTooLarge { limit }
        } else {
            RequestReadError::Body(e.to_string())
        }
    })
}

fn is_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> Result<(Value, BodyKind), RequestReadError> {
    if bytes.is_empty() {
        return Ok((Value::Object(Map::new()), BodyKind::Empty));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        });

    match content_type.as_deref() {
        None | Some("application/json") => parse_json(bytes),
        Some(ct) if ct.ends_with("+json") => parse_json(bytes),
        Some("application/x-www-form-urlencoded") => {
            Ok((pairs_value(form_urlencoded::parse(bytes)), BodyKind::Form))
        }
        Some(other) => Err(RequestReadError::UnsupportedMediaType(other.to_string())),
    }
}

fn parse_json(bytes: &Bytes) -> Result<(Value, BodyKind), RequestReadError> {
    serde_json::from_slice(bytes)
        .map(|v| (v, BodyKind::Json))
        .map_err(|e| RequestReadError::MalformedBody(e.to_string()))
}

/// Encode an object as urlencoded pairs. Arrays repeat their key;
/// nested objects are written as JSON text.
fn encode_pairs(value: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Value::Object(map) = value {
        for (key, v) in map {
            match v {
                Value::Array(items) => {
                    for item in items {
                        serializer.append_pair(key, &scalar_text(item));
                    }
                }
                other => {
                    serializer.append_pair(key, &scalar_text(other));
                }
            }
        }
    }
    serializer.finish()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, RequestReadError> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{query}", uri.path())
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| RequestReadError::Rewrite(e.to_string()))?,
    );
    Uri::from_parts(parts).map_err(|e| RequestReadError::Rewrite(e.to_string()))
}

/// The rewritten body is sent whole, so any chunked framing goes too.
fn set_content_length(headers: &mut HeaderMap, len: usize) {
    headers.remove(header::TRANSFER_ENCODING);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
}
