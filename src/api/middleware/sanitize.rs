//! JSON body sanitization.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Returns true for `application/json` and `application/*+json` bodies.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Replaces a JSON request body with its sanitized copy.
///
/// Non-JSON and empty bodies pass through untouched.
///
/// # Errors
///
/// - `413 Payload Too Large` if the body exceeds `max_body_bytes`
/// - `400 Bad Request` with `Invalid JSON body` if the body does not parse
/// - `400 Bad Request` if the document nests deeper than the sanitizer allows
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_json(req.headers()) {
        return Ok(next.run(req).await);
    }

    let too_large = || AppError::payload_too_large("Request body too large");

    if declared_length(req.headers()).is_some_and(|len| len > st.max_body_bytes) {
        return Err(too_large());
    }

    let (mut parts, body) = req.into_parts();
    let bytes = to_bytes(body, st.max_body_bytes)
        .await
        .map_err(|_| too_large())?;

    if bytes.is_empty() {
        return Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await);
    }

    let value: Value =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON body"))?;

    let sanitized = st.sanitizer.sanitize(&value).map_err(|e| {
        debug!(error = %e, "Rejected request body");
        AppError::bad_request(e.to_string())
    })?;

    let body = serde_json::to_vec(&sanitized)
        .map_err(|e| AppError::internal(format!("Failed to encode sanitized body: {e}")))?;

    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

    Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).unwrap(),
        );
        headers
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&headers("application/json")));
        assert!(is_json(&headers("application/json; charset=utf-8")));
        assert!(is_json(&headers("Application/JSON")));
        assert!(is_json(&headers("application/merge-patch+json")));
        assert!(!is_json(&headers("text/plain")));
        assert!(!is_json(&headers("multipart/form-data; boundary=x")));
        assert!(!is_json(&HeaderMap::new()));
    }
}
