//! Request handling and normalization.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) and propagate it
//! - Enforce the body size limit, telling it apart from interrupted bodies
//! - Normalize an HTTP request into method, path, query and body maps
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Query strings and form bodies are flat string maps; repeated keys keep
//!   the last value
//! - Unknown content types yield an empty body rather than an error

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request};
use futures_util::StreamExt;
use serde_json::{Map, Value};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Normalized inbound request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    /// HTTP method as received.
    pub method: String,
    /// Path, possibly still carrying its query string.
    pub path: String,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
}

/// Problems turning an HTTP request into an [`InboundRequest`].
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("JSON body must be an object")]
    NotAnObject,
}

impl InboundRequest {
    /// Read and normalize an HTTP request.
    pub async fn from_http(request: Request<Body>, max_body_size: usize) -> Result<Self, RequestError> {
        let (parts, body) = request.into_parts();

        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let query = parts.uri.query().map(parse_form).unwrap_or_default();

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let bytes = read_body(body, max_body_size).await?;

        Ok(Self {
            method: parts.method.as_str().to_string(),
            path,
            query,
            body: parse_body(&content_type, &bytes)?,
        })
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, RequestError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(RequestError::Read)?;
        if buf.len() + chunk.len() > limit {
            return Err(RequestError::BodyTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

fn parse_body(content_type: &str, bytes: &[u8]) -> Result<Map<String, Value>, RequestError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence == "application/json" || essence.ends_with("+json") {
        return match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(RequestError::NotAnObject),
        };
    }
    if essence == "application/x-www-form-urlencoded" {
        return Ok(parse_form_bytes(bytes));
    }

    tracing::debug!(content_type = %content_type, "Ignoring body with unsupported content type");
    Ok(Map::new())
}

fn parse_form(raw: &str) -> Map<String, Value> {
    parse_form_bytes(raw.as_bytes())
}

fn parse_form_bytes(raw: &[u8]) -> Map<String, Value> {
    url::form_urlencoded::parse(raw)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID of a request, or "unknown".
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
