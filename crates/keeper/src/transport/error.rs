// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single place `keeper_core::SupervisorError` becomes a wire response
//! (`SPEC_FULL.md` §7): an HTTP status plus the uniform
//! `{success: false, error: {code, message}}` envelope. Nothing upstream of
//! here should format an error for a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keeper_core::ErrorKind;
use serde::Serialize;

/// Flat, `Copy` error code surfaced on the wire — stable independent of the
/// underlying error's `Display` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    TooManySessions,
    InvalidInput,
    Unavailable,
    Busy,
    Internal,
}

impl ErrorCode {
    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::TooManySessions => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Busy => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::TooManySessions => "too_many_sessions",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::Busy => "busy",
            ErrorCode::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Capacity => ErrorCode::TooManySessions,
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::ResourceUnavailable => ErrorCode::Unavailable,
            ErrorKind::Busy => ErrorCode::Busy,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Wraps a [`keeper_core::SupervisorError`] so it can be returned directly
/// from an axum handler as its `Err` branch.
pub struct ApiError(pub keeper_core::SupervisorError);

impl From<keeper_core::SupervisorError> for ApiError {
    fn from(err: keeper_core::SupervisorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = ErrorCode::from(self.0.kind());
        if code == ErrorCode::Internal {
            tracing::error!(error = %self.0, "internal error");
        }
        let body = ErrorBody { success: false, error: ErrorDetail { code: code.as_str(), message: self.0.to_string() } };
        (code.http_status(), Json(body)).into_response()
    }
}
