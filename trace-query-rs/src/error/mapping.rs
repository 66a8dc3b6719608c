//! Mapping of transport failures and HTTP statuses to error details
//!
//! Each remote client picks the `TranslateError` variant for its own step;
//! these helpers only produce the human-readable detail and the context.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use super::ErrorContext;
use crate::util::truncate_string;

/// Longest response body excerpt carried in an error message
const MAX_BODY_EXCERPT: usize = 200;

/// Describe a `reqwest` failure that happened before a status was received
pub fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("no response within {}ms", timeout.as_millis())
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_decode() {
        format!("response could not be decoded: {}", err)
    } else if err.is_request() {
        format!("request could not be sent: {}", err)
    } else {
        format!("HTTP client error: {}", err)
    }
}

/// Describe a non-2xx response, pulling a message out of a JSON body when present
pub fn describe_http_error(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let message = json
            .get("error")
            .and_then(|e| e.as_str().or_else(|| e.get("msg").and_then(|m| m.as_str())))
            .or_else(|| json.get("message").and_then(|m| m.as_str()));

        if let Some(message) = message {
            return format!("{} ({})", status, message);
        }
    }

    if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate_string(body.trim(), MAX_BODY_EXCERPT))
    }
}

/// Build an error context for a call to `endpoint` on `remote`
pub fn http_context(remote: &str, endpoint: &str, status: Option<StatusCode>) -> ErrorContext {
    let context = ErrorContext::for_remote(remote).endpoint(endpoint);

    match status {
        Some(status) => context.status_code(status.as_u16()),
        None => context,
    }
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "validation",
        401 | 403 => "authorization",
        404 => "not_found",
        408 | 504 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}
