// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::StatusCode;
use keeper_core::bus::EventBus;
use keeper_core::error::MuxError;
use keeper_core::mux::{CreateSessionOpts, CreatedSession, MultiplexerAdapter, PaneRecord, PaneStats, RespawnOpts};
use keeper_core::{Supervisor, SupervisorConfig};
use tokio_util::sync::CancellationToken;

use super::AppState;
use crate::transport::build_router;

/// Minimal in-memory multiplexer stand-in for exercising the HTTP surface
/// without a real `tmux` binary.
#[derive(Default)]
struct FakeMux;

impl MultiplexerAdapter for FakeMux {
    fn create_session(
        &self,
        opts: CreateSessionOpts,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedSession, MuxError>> + Send + '_>> {
        Box::pin(async move { Ok(CreatedSession { mux_name: format!("keeper:{}", opts.session_id), pid: Some(4242) }) })
    }

    fn respawn_pane(&self, _mux_name: &str, _opts: RespawnOpts) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn kill_session(&self, _mux_name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn send_keys(&self, _mux_name: &str, _bytes: &[u8]) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn resize(&self, _mux_name: &str, _cols: u16, _rows: u16) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn update_name(&self, _mux_name: &str, _name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<PaneRecord>, MuxError>> + Send + '_>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn stats(&self, _pid: i32) -> Pin<Box<dyn Future<Output = Option<PaneStats>> + Send + '_>> {
        Box::pin(async { None })
    }
}

async fn test_state(auth_token: Option<&str>) -> (Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new();
    let supervisor = Supervisor::new(
        SupervisorConfig { state_dir: dir.path().to_path_buf(), max_sessions: 8, mux: Arc::new(FakeMux), oracle: None },
        bus.clone(),
    )
    .await
    .unwrap();
    let state = Arc::new(AppState {
        supervisor,
        bus,
        auth_token: auth_token.map(str::to_string),
        shutdown: CancellationToken::new(),
    });
    (state, dir)
}

#[tokio::test]
async fn health_reports_zero_sessions_initially() {
    let (state, _dir) = test_state(None).await;
    let server = axum_test::TestServer::new(build_router(state)).unwrap();

    let resp = server.get("/api/v1/health").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn create_list_and_delete_session_round_trip() {
    let (state, _dir) = test_state(None).await;
    let server = axum_test::TestServer::new(build_router(state)).unwrap();

    let resp = server
        .post("/api/v1/sessions")
        .json(&serde_json::json!({"working_dir": "/tmp", "mode": "shell", "name": "demo"}))
        .await;
    resp.assert_status(StatusCode::OK);
    let created: serde_json::Value = resp.json();
    let id = created["id"].as_str().unwrap().to_string();

    let resp = server.get("/api/v1/sessions").await;
    let list: serde_json::Value = resp.json();
    assert_eq!(list["sessions"].as_array().unwrap().len(), 1);

    let resp = server.delete(&format!("/api/v1/sessions/{id}?kill_mux=true")).await;
    resp.assert_status(StatusCode::OK);

    let resp = server.get("/api/v1/sessions").await;
    let list: serde_json::Value = resp.json();
    assert!(list["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_unknown_session_is_404_with_uniform_envelope() {
    let (state, _dir) = test_state(None).await;
    let server = axum_test::TestServer::new(build_router(state)).unwrap();

    let resp = server.get(&format!("/api/v1/sessions/{}", uuid::Uuid::new_v4())).await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn missing_bearer_token_is_rejected() {
    let (state, _dir) = test_state(Some("secret")).await;
    let server = axum_test::TestServer::new(build_router(state)).unwrap();

    let resp = server.get("/api/v1/sessions").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_exempt_from_auth() {
    let (state, _dir) = test_state(Some("secret")).await;
    let server = axum_test::TestServer::new(build_router(state)).unwrap();

    let resp = server.get("/api/v1/health").await;
    resp.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn write_and_resize_reach_the_session() {
    let (state, _dir) = test_state(None).await;
    let server = axum_test::TestServer::new(build_router(state)).unwrap();

    let resp = server
        .post("/api/v1/sessions")
        .json(&serde_json::json!({"working_dir": "/tmp", "mode": "shell", "name": "demo"}))
        .await;
    let created: serde_json::Value = resp.json();
    let id = created["id"].as_str().unwrap().to_string();

    let resp = server.post(&format!("/api/v1/sessions/{id}/input")).json(&serde_json::json!({"text": "ls\n"})).await;
    resp.assert_status(StatusCode::OK);

    let resp = server.post(&format!("/api/v1/sessions/{id}/resize")).json(&serde_json::json!({"cols": 100, "rows": 40})).await;
    resp.assert_status(StatusCode::OK);
}
