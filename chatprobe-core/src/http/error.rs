//! HTTP error mapping utilities

use crate::error::{ApiError, ApiErrorKind};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Longest error message kept from a response body, in characters
pub const MAX_ERROR_MESSAGE_CHARS: usize = 512;

/// Map HTTP status code, headers and response body to an [`ApiError`]
pub fn map_http_error(
    status: StatusCode,
    headers: Option<&HeaderMap>,
    body: Option<String>,
    request_id: Uuid,
) -> ApiError {
    let details = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_details(&v));

    let header_retry_after = headers
        .and_then(|h| h.get(RETRY_AFTER))
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);

    let (message, error_type, code, param, body_retry_after) = match details {
        Some(d) => (
            bounded_message(&d.message),
            d.error_type,
            d.code,
            d.param,
            d.retry_after_seconds,
        ),
        None => {
            let message = body
                .map(|b| bounded_message(&b))
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
            (message, None, None, None, None)
        }
    };

    ApiError {
        status: status.as_u16(),
        kind: ApiErrorKind::from_status(status.as_u16()),
        message,
        error_type,
        code,
        param,
        retry_after: header_retry_after.or(body_retry_after.map(Duration::from_secs)),
        request_id,
    }
}

/// Collapse whitespace runs (newlines included) and cap the length
///
/// The message ends up on a single console line.
pub fn bounded_message(raw: &str) -> String {
    let mut message = String::new();
    let mut kept = 0;
    for word in raw.split_whitespace() {
        if kept > 0 {
            message.push(' ');
            kept += 1;
        }
        for c in word.chars() {
            if kept == MAX_ERROR_MESSAGE_CHARS {
                message.push_str("...");
                return message;
            }
            message.push(c);
            kept += 1;
        }
    }
    message
}

/// Error details extracted from response body
#[derive(Debug, Default, PartialEq)]
struct ErrorDetails {
    message: String,
    error_type: Option<String>,
    code: Option<String>,
    param: Option<String>,
    retry_after_seconds: Option<u64>,
}

/// Extract error details from a JSON error body
fn extract_error_details(json: &Value) -> Option<ErrorDetails> {
    // OpenAI format: { "error": { "message": "...", "type": "...", "code": "...", "param": ... } }
    if let Some(error) = json.get("error").filter(|e| e.is_object()) {
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            return Some(ErrorDetails {
                message: message.to_string(),
                error_type: string_field(error, "type"),
                code: string_field(error, "code"),
                param: string_field(error, "param"),
                retry_after_seconds: error.get("retry_after").and_then(|v| v.as_u64()),
            });
        }
    }

    // Generic format: { "message": "...", "code": ... }
    if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
        return Some(ErrorDetails {
            message: message.to_string(),
            code: string_field(json, "code"),
            retry_after_seconds: json.get("retry_after").and_then(|v| v.as_u64()),
            ..Default::default()
        });
    }

    if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
        return Some(ErrorDetails {
            message: error.to_string(),
            ..Default::default()
        });
    }

    None
}

/// Read a field that routers send either as a string or as a number
fn string_field(json: &Value, key: &str) -> Option<String> {
    match json.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse Retry-After header value
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    // Only the delay-seconds form; HTTP dates are ignored
    header_value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
