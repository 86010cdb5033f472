//! Request handling: request IDs, tracing spans and input coercion.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Incoming `x-request-id` is kept, otherwise a UUID v4 is generated
//! - Loose JSON scalars are coerced into the typed inputs handlers need

use axum::{body::Body, http::Request};
use serde_json::Value;
use tracing::Span;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Build the per-request tracing span, tagged with the request ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Non-empty string field.
pub fn non_empty_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)?.as_str().filter(|s| !s.is_empty())
}

/// Article index from a JSON integer, integral float, or numeric string.
pub fn parse_article_id(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Vote direction from a bool, number, or common textual spelling.
///
/// Absent or null means a downvote.
pub fn parse_upvote(value: Option<&Value>) -> Option<bool> {
    match value {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Some(true),
            "false" | "0" | "no" | "n" | "off" | "" => Some(false),
            _ => None,
        },
        Some(Value::Array(_)) | Some(Value::Object(_)) => None,
    }
}
