// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token check applied as axum middleware in front of every route
//! except health and the hook ingress (called from inside the pane's own
//! machine, no token available there).

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::AppState;

/// Constant-time comparison to avoid a timing side-channel on token length/prefix.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

fn validate_bearer(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else { return true };
    let Some(header) = headers.get("authorization").and_then(|v| v.to_str().ok()) else { return false };
    let Some(token) = header.strip_prefix("Bearer ") else { return false };
    constant_time_eq(token, expected)
}

pub async fn auth_layer(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if path == "/api/v1/health" || path.starts_with("/api/v1/hooks") {
        return next.run(req).await;
    }
    if !validate_bearer(req.headers(), state.auth_token.as_deref()) {
        let body = serde_json::json!({ "success": false, "error": { "code": "unauthorized", "message": "missing or invalid bearer token" } });
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_token_configured_always_passes() {
        assert!(validate_bearer(&HeaderMap::new(), None));
    }

    #[test]
    fn matching_bearer_token_passes() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer secret".parse().unwrap());
        assert!(validate_bearer(&headers, Some("secret")));
    }

    #[test]
    fn missing_header_fails() {
        assert!(!validate_bearer(&HeaderMap::new(), Some("secret")));
    }

    #[test]
    fn wrong_token_fails() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer wrong".parse().unwrap());
        assert!(!validate_bearer(&headers, Some("secret")));
    }
}
