// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/SSE server glue: builds the axum `Router`, owns the shared
//! [`AppState`], and is the only place a [`keeper_core::SupervisorError`]
//! becomes a wire response (see [`error::ApiError`]).

pub mod auth;
pub mod error;
pub mod http;
pub mod sse;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use keeper_core::bus::EventBus;
use keeper_core::Supervisor;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub supervisor: Arc<Supervisor>,
    pub bus: Arc<EventBus>,
    pub auth_token: Option<String>,
    pub shutdown: CancellationToken,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::health))
        .route("/api/v1/sessions", get(http::list_sessions).post(http::create_session))
        .route("/api/v1/sessions/{id}", get(http::get_session).delete(http::delete_session))
        .route("/api/v1/sessions/{id}/input", post(http::input))
        .route("/api/v1/sessions/{id}/resize", post(http::resize))
        .route("/api/v1/hooks", post(http::hooks))
        .route("/api/v1/events", get(sse::events))
        .route("/api/v1/shutdown", post(http::shutdown))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), auth::auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health-only router for `--health-port`, unauthenticated by construction.
pub fn build_health_router(state: Arc<AppState>) -> Router {
    Router::new().route("/api/v1/health", get(http::health)).with_state(state)
}
