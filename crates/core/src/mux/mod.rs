// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexer adapter contract: creates/kills/reconciles detached panes,
//! sends keys, and reports liveness. `tmux` is the reference implementation
//! (see [`tmux::TmuxAdapter`]); anything satisfying [`MultiplexerAdapter`]
//! can stand in for it.

pub mod tmux;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::error::MuxError;
use crate::session::SessionId;

/// Parsed `"tmux:name"` / `"screen:name"` backend spec, mirroring how a
/// single-process session runtime resolves its one backend from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterSpec {
    Tmux,
    Screen,
}

impl std::str::FromStr for AdapterSpec {
    type Err = MuxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tmux" => Ok(AdapterSpec::Tmux),
            "screen" => Ok(AdapterSpec::Screen),
            "" => Err(MuxError::CommandFailed("empty adapter spec".into())),
            other => Err(MuxError::CommandFailed(format!("unknown backend: {other}"))),
        }
    }
}

pub struct CreateSessionOpts {
    pub session_id: SessionId,
    pub working_dir: PathBuf,
    pub command: Vec<String>,
    pub cols: u16,
    pub rows: u16,
    /// Pane-scoped environment, set via `setenv` — never interpolated into
    /// a shell command string.
    pub env: Vec<(String, String)>,
}

pub struct CreatedSession {
    pub mux_name: String,
    pub pid: Option<i32>,
}

pub struct RespawnOpts {
    pub command: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// One live (or persisted) pane record, as returned by [`MultiplexerAdapter::list_sessions`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaneRecord {
    pub mux_name: String,
    pub pid: Option<i32>,
    pub foreground_command: Option<String>,
}

/// Multiplexer capability contract (`SPEC_FULL.md` §6). Object-safe so the
/// supervisor can hold `Arc<dyn MultiplexerAdapter>` regardless of backend.
pub trait MultiplexerAdapter: Send + Sync {
    fn create_session(
        &self,
        opts: CreateSessionOpts,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedSession, MuxError>> + Send + '_>>;

    fn respawn_pane(
        &self,
        mux_name: &str,
        opts: RespawnOpts,
    ) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>>;

    fn kill_session(&self, mux_name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>>;

    fn send_keys(&self, mux_name: &str, bytes: &[u8]) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>>;

    fn resize(&self, mux_name: &str, cols: u16, rows: u16) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>>;

    fn update_name(&self, mux_name: &str, name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>>;

    /// Enumerate all panes currently managed by the multiplexer, used by
    /// the persistence layer's startup reconciliation.
    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<PaneRecord>, MuxError>> + Send + '_>>;

    /// Sample CPU/memory for a pane's foreground pid. Best-effort: absence
    /// of a pid (already exited, replaced by a shell) yields `None`.
    fn stats(&self, pid: i32) -> Pin<Box<dyn Future<Output = Option<PaneStats>> + Send + '_>>;
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct PaneStats {
    pub cpu_percent: f32,
    pub rss_kb: u64,
}

#[cfg(test)]
#[path = "mux_tests.rs"]
mod tests;
