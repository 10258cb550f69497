//! Response normalization.
//!
//! # Responsibilities
//! - Map every dispatch outcome to a uniform `{code, message | data}` envelope
//! - Serialize remote failures losslessly
//!
//! # Design Decisions
//! - HTTP status is always 200; the envelope code carries the outcome
//! - A response with no fields is reported as the "empty" sentinel
//! - Resolution failures and unusable parameters share code 1 with no-route,
//!   with the detail as message

use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::Outcome;
use crate::http::request::RequestError;

/// Remote call succeeded.
pub const CODE_OK: i32 = 0;
/// No route, resolution failure, unusable parameters or unreadable request.
pub const CODE_ERROR: i32 = 1;
/// Remote call failed.
pub const CODE_REMOTE_FAILURE: i32 = 2;

/// Message of the no-route envelope.
pub const NO_ROUTE_MESSAGE: &str = "error";
/// Message of a successful call that returned nothing.
pub const EMPTY_MESSAGE: &str = "empty";

/// Envelope returned for every inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn success(data: Value) -> Self {
        if is_empty_payload(&data) {
            return Self::with_message(CODE_OK, EMPTY_MESSAGE);
        }
        Self {
            code: CODE_OK,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_message(CODE_ERROR, message)
    }

    fn with_message(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }
}

fn is_empty_payload(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Map a dispatch outcome to its envelope.
pub fn normalize(outcome: Outcome) -> ResponseEnvelope {
    match outcome {
        Outcome::Success(data) => ResponseEnvelope::success(data),
        Outcome::NoRoute => ResponseEnvelope::error(NO_ROUTE_MESSAGE),
        Outcome::ResolutionFailed(e) => ResponseEnvelope::error(e.to_string()),
        Outcome::InvalidPayload(e) => ResponseEnvelope::error(e.to_string()),
        Outcome::RemoteFailure(e) => {
            let detail = serde_json::to_string(&e).unwrap_or_else(|_| e.to_string());
            ResponseEnvelope::with_message(CODE_REMOTE_FAILURE, detail)
        }
    }
}

impl From<Outcome> for ResponseEnvelope {
    fn from(outcome: Outcome) -> Self {
        normalize(outcome)
    }
}

impl From<&RequestError> for ResponseEnvelope {
    fn from(e: &RequestError) -> Self {
        ResponseEnvelope::error(e.to_string())
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
