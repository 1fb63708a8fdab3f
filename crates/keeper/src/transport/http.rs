// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin REST handlers: each one validates its request, calls a single
//! [`keeper_core::Supervisor`] method, and serializes the result. No
//! business logic lives here — that's the point of the core/transport split.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use keeper_core::session::Mode;
use keeper_core::{HookEvent, SessionId};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
    sessions: usize,
    subscribers: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
        sessions: state.supervisor.list_sessions().await.len(),
        subscribers: state.bus.subscriber_count().await,
    })
}

#[derive(Serialize)]
pub struct SessionsBody {
    sessions: Vec<keeper_core::session::LightSessionState>,
}

pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SessionsBody { sessions: state.supervisor.list_sessions().await })
}

#[derive(Deserialize)]
pub struct CreateSessionBody {
    working_dir: PathBuf,
    mode: Mode,
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    command: Vec<String>,
    #[serde(default = "default_cols")]
    cols: u16,
    #[serde(default = "default_rows")]
    rows: u16,
}

fn default_cols() -> u16 {
    200
}

fn default_rows() -> u16 {
    50
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .supervisor
        .create_session(
            body.working_dir,
            body.mode,
            body.name,
            body.color.unwrap_or_else(|| "blue".to_string()),
            &body.command,
            body.cols,
            body.rows,
        )
        .await?;
    Ok(Json(session.light_snapshot().await))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.supervisor.get_session(id).await?;
    Ok(Json(session.light_snapshot().await))
}

#[derive(Deserialize)]
pub struct DeleteSessionQuery {
    #[serde(default)]
    kill_mux: bool,
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    axum::extract::Query(query): axum::extract::Query<DeleteSessionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.cleanup_session(id, query.kill_mux).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct InputBody {
    /// Raw bytes to write, as UTF-8 text (control sequences go through
    /// `/input` as literal escape bytes embedded in the string).
    text: String,
}

pub async fn input(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(body): Json<InputBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.supervisor.get_session(id).await?;
    session.write(body.text.as_bytes()).await.map_err(keeper_core::SupervisorError::from)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct ResizeBody {
    cols: u16,
    rows: u16,
}

pub async fn resize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(body): Json<ResizeBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.supervisor.get_session(id).await?;
    session.resize(body.cols, body.rows).await.map_err(keeper_core::SupervisorError::from)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `POST /api/v1/hooks` — ingress for a session's hook notifier (called
/// from inside the pane's own machine; skips bearer auth, see
/// [`super::auth::auth_layer`]).
pub async fn hooks(
    State(state): State<Arc<AppState>>,
    Json(hook): Json<HookEvent>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.handle_hook(hook).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn shutdown(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.shutdown.cancel();
    Json(serde_json::json!({ "success": true, "accepted": true }))
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
