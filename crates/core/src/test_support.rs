// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a fake multiplexer and session builder.

#![cfg(test)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::MuxError;
use crate::mux::{CreateSessionOpts, CreatedSession, MultiplexerAdapter, PaneRecord, PaneStats, RespawnOpts};
use crate::session::{Mode, Session, SessionConfig, SessionId};

/// Records every call it receives; never talks to a real process.
#[derive(Default)]
pub struct FakeMux {
    pub sent_keys: Mutex<Vec<Vec<u8>>>,
    pub killed: AtomicU32,
    /// What `list_sessions` reports, set up-front by tests exercising
    /// startup reconciliation.
    pub live_panes: Mutex<Vec<PaneRecord>>,
}

impl MultiplexerAdapter for FakeMux {
    fn create_session(
        &self,
        opts: CreateSessionOpts,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedSession, MuxError>> + Send + '_>> {
        Box::pin(async move { Ok(CreatedSession { mux_name: format!("fake-{}", opts.session_id), pid: Some(4242) }) })
    }

    fn respawn_pane(&self, _mux_name: &str, _opts: RespawnOpts) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }

    fn kill_session(&self, _mux_name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        self.killed.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(()) })
    }

    fn send_keys(&self, _mux_name: &str, bytes: &[u8]) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        let bytes = bytes.to_vec();
        Box::pin(async move {
            self.sent_keys.lock().await.push(bytes);
            Ok(())
        })
    }

    fn resize(&self, _mux_name: &str, _cols: u16, _rows: u16) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }

    fn update_name(&self, _mux_name: &str, _name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }

    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<PaneRecord>, MuxError>> + Send + '_>> {
        Box::pin(async move { Ok(self.live_panes.lock().await.clone()) })
    }

    fn stats(&self, _pid: i32) -> Pin<Box<dyn Future<Output = Option<PaneStats>> + Send + '_>> {
        Box::pin(async move { None })
    }
}

/// Build a started [`Session`] backed by a [`FakeMux`], ready for tests
/// that need a real session without a real pane.
pub async fn started_session(mode: Mode) -> (Arc<Session>, Arc<FakeMux>) {
    let mux = Arc::new(FakeMux::default());
    let session = Arc::new(Session::new(SessionConfig {
        id: SessionId::new(),
        working_dir: std::env::temp_dir(),
        mode,
        name: "test".to_string(),
        color: "blue".to_string(),
        mux: mux.clone(),
        event_capacity: 64,
    }));
    session.start_interactive(&[], 80, 24).await.unwrap();
    (session, mux)
}
