// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::test_support::FakeMux;

fn config(mux: Arc<FakeMux>) -> SessionConfig {
    SessionConfig {
        id: SessionId::new(),
        working_dir: std::env::temp_dir(),
        mode: Mode::Shell,
        name: "demo".to_string(),
        color: "green".to_string(),
        mux,
        event_capacity: 32,
    }
}

#[tokio::test]
async fn start_interactive_sets_mux_name_and_emits_started() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(mux));
    let mut events = session.subscribe();

    session.start_interactive(&[], 80, 24).await.unwrap();
    assert!(session.mux_name().await.is_some());
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Started));
}

#[tokio::test]
async fn double_start_reports_already_started() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(mux));
    session.start_interactive(&[], 80, 24).await.unwrap();
    let err = session.start_interactive(&[], 80, 24).await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyStarted));
}

#[tokio::test]
async fn write_routes_bytes_to_the_mux() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(Arc::clone(&mux)));
    session.start_interactive(&[], 80, 24).await.unwrap();

    session.write(b"hello").await.unwrap();
    assert_eq!(*mux.sent_keys.lock().await, vec![b"hello".to_vec()]);
}

#[tokio::test]
async fn write_before_start_reports_pane_not_found() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(mux));
    let err = session.write(b"hi").await.unwrap_err();
    assert!(matches!(err, SessionError::PaneNotFound));
}

#[tokio::test]
async fn attach_adopts_a_pane_without_creating_one() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(mux));
    session.attach("adopted-pane".to_string(), Some(99)).await;
    assert_eq!(session.mux_name().await.as_deref(), Some("adopted-pane"));
}

#[tokio::test]
async fn stop_emits_exit_and_optionally_kills_the_mux() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(Arc::clone(&mux)));
    session.start_interactive(&[], 80, 24).await.unwrap();

    session.stop(true).await.unwrap();
    assert_eq!(mux.killed.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_prompt_rejects_non_claude_modes() {
    let mux = Arc::new(FakeMux::default());
    let session = Session::new(config(mux));
    let err = session.run_prompt("hello").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}

#[tokio::test]
async fn run_prompt_reports_busy_when_interactive_attach_is_live() {
    let mux = Arc::new(FakeMux::default());
    let mut cfg = config(mux);
    cfg.mode = Mode::Claude;
    let session = Session::new(cfg);
    session.start_interactive(&[], 80, 24).await.unwrap();

    let err = session.run_prompt("hello").await.unwrap_err();
    assert!(matches!(err, SessionError::Busy));
}

#[tokio::test]
async fn light_snapshot_reflects_id_and_mode() {
    let mux = Arc::new(FakeMux::default());
    let cfg = config(mux);
    let id = cfg.id;
    let session = Session::new(cfg);

    let light = session.light_snapshot().await;
    assert_eq!(light.id, id);
    assert_eq!(light.mode, Mode::Shell);
}
