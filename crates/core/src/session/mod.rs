// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session: a mode-aware wrapper around one multiplexer-backed PTY pane.
//!
//! Mirrors the shape of a single-process session runtime, generalized so
//! the supervisor can own many of these keyed by [`SessionId`].

mod buffers;
mod content_filter;
mod mode;
mod pipeline;
mod state;

pub use buffers::SessionBuffers;
pub use mode::{ClaudeMode, Mode, ModeProfile, OpenCodeMode, ShellMode};
pub use state::{LightSessionState, SessionFlags, SessionState, SessionStatus};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::mux::MultiplexerAdapter;
use crate::progress::{CircuitBreaker, ProgressParser};

/// Opaque session identifier, persisted and used as the supervisor's map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a one-shot [`Session::run_prompt`] invocation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PromptResult {
    pub result: String,
    pub cost: f64,
}

/// Shape of the Claude CLI's `--output-format json` final message. Only the
/// two fields the spec's `{result, cost}` return value needs are modeled;
/// the rest of that payload (session id, duration, turn count, …) is not
/// surfaced here.
#[derive(Debug, serde::Deserialize)]
struct ClaudeJsonOutput {
    result: String,
    #[serde(default)]
    total_cost_usd: f64,
}

/// Construction parameters for a new [`Session`] (not derivable from
/// persisted state alone — the mux adapter and event capacity are runtime
/// wiring owned by the supervisor).
pub struct SessionConfig {
    pub id: SessionId,
    pub working_dir: std::path::PathBuf,
    pub mode: Mode,
    pub name: String,
    pub color: String,
    pub mux: Arc<dyn MultiplexerAdapter>,
    pub event_capacity: usize,
}

/// One supervised CLI pane: buffers, mode-aware detection, and a serialized
/// writer. Cheap to clone (all fields behind `Arc`/interior mutability);
/// the supervisor hands out clones freely.
pub struct Session {
    pub id: SessionId,
    pub working_dir: std::path::PathBuf,
    pub mode: Mode,
    profile: Box<dyn ModeProfile>,
    name: RwLock<String>,
    color: RwLock<String>,
    mux: Arc<dyn MultiplexerAdapter>,
    mux_name: RwLock<Option<String>>,
    pid: RwLock<Option<i32>>,
    buffers: RwLock<SessionBuffers>,
    state: RwLock<SessionState>,
    progress: Mutex<ProgressParser>,
    breaker: Mutex<CircuitBreaker>,
    events: broadcast::Sender<SessionEvent>,
    write_lock: Mutex<()>,
    started: AtomicBool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(16));
        Self {
            id: config.id,
            working_dir: config.working_dir,
            mode: config.mode,
            profile: mode::profile_for(config.mode),
            name: RwLock::new(config.name),
            color: RwLock::new(config.color),
            mux: config.mux,
            mux_name: RwLock::new(None),
            pid: RwLock::new(None),
            buffers: RwLock::new(SessionBuffers::default()),
            state: RwLock::new(SessionState::default()),
            progress: Mutex::new(ProgressParser::default()),
            breaker: Mutex::new(CircuitBreaker::default()),
            events,
            write_lock: Mutex::new(()),
            started: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is the common case right after creation; a send
        // error here just means nobody is listening yet.
        let _ = self.events.send(event);
    }

    /// Create (or adopt) a pane and begin reading its output.
    pub async fn start_interactive(
        &self,
        command: &[String],
        cols: u16,
        rows: u16,
    ) -> Result<(), SessionError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyStarted);
        }
        let created = self
            .mux
            .create_session(crate::mux::CreateSessionOpts {
                session_id: self.id,
                working_dir: self.working_dir.clone(),
                command: command.to_vec(),
                cols,
                rows,
                env: Vec::new(),
            })
            .await
            .map_err(|e| {
                self.started.store(false, Ordering::SeqCst);
                SessionError::InvalidConfig(e.to_string())
            })?;
        *self.mux_name.write().await = Some(created.mux_name);
        *self.pid.write().await = created.pid;
        self.emit(SessionEvent::Started);

        if matches!(self.mode, Mode::OpenCode) {
            self.wait_for_stabilization().await;
        }
        Ok(())
    }

    pub async fn start_shell(&self, cols: u16, rows: u16) -> Result<(), SessionError> {
        self.start_interactive(&[], cols, rows).await
    }

    /// One-shot Claude invocation: launch `claude -p <prompt>` with
    /// structured-JSON output, stream to exit, and return `{result, cost}`.
    /// Fails with `SessionError::Busy` if an interactive attach is already
    /// live on this Session, and never touches the multiplexer — there is
    /// no pane to manage for a process that exits on its own.
    pub async fn run_prompt(&self, prompt: &str) -> Result<PromptResult, SessionError> {
        if !matches!(self.mode, Mode::Claude) {
            return Err(SessionError::InvalidConfig("runPrompt is only supported in claude mode".to_string()));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SessionError::Busy);
        }
        let outcome = self.run_prompt_inner(prompt).await;
        self.started.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run_prompt_inner(&self, prompt: &str) -> Result<PromptResult, SessionError> {
        let output = tokio::process::Command::new("claude")
            .args(["-p", prompt, "--output-format", "json"])
            .current_dir(&self.working_dir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(SessionError::InvalidConfig(format!(
                "claude exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let parsed: ClaudeJsonOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| SessionError::InvalidConfig(format!("malformed structured output: {e}")))?;

        let result = PromptResult { result: parsed.result, cost: parsed.total_cost_usd };
        self.emit(SessionEvent::Completion { cost: result.cost });
        Ok(result)
    }

    /// Adopt an already-live multiplexer pane discovered during startup
    /// reconciliation, without issuing `create_session`.
    pub async fn attach(&self, mux_name: String, pid: Option<i32>) {
        self.started.store(true, Ordering::SeqCst);
        *self.mux_name.write().await = Some(mux_name);
        *self.pid.write().await = pid;
        self.emit(SessionEvent::Started);
    }

    /// Wait up to 15s for the opencode TUI to settle: ready once 2s pass
    /// with no content change and the buffer holds at least 200 bytes.
    async fn wait_for_stabilization(&self) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
        loop {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if tokio::time::Instant::now() >= deadline {
                return;
            }
            let state = self.state.read().await;
            let buffers = self.buffers.read().await;
            let quiet_for = now_epoch_ms().saturating_sub(state.last_activity_at);
            if quiet_for >= 2_000 && buffers.terminal.len() >= 200 {
                return;
            }
        }
    }

    /// Feed a raw chunk of PTY output through the processing pipeline.
    pub async fn feed_output(&self, chunk: &[u8]) {
        pipeline::process_chunk(self, chunk).await;
    }

    /// Write raw bytes straight to the PTY.
    pub async fn write(&self, bytes: &[u8]) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let name = self.mux_name.read().await.clone().ok_or(SessionError::PaneNotFound)?;
        self.mux.send_keys(&name, bytes).await.map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }

    /// Ask the multiplexer to inject keystrokes (fire-and-forget, short deadline).
    pub async fn write_via_mux(&self, bytes: &[u8]) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let name = self.mux_name.read().await.clone().ok_or(SessionError::PaneNotFound)?;
        match tokio::time::timeout(Duration::from_millis(500), self.mux.send_keys(&name, bytes)).await {
            Ok(Ok(())) => Ok(()),
            _ => self.write(bytes).await,
        }
    }

    pub async fn resize(&self, cols: u16, rows: u16) -> Result<(), SessionError> {
        let name = self.mux_name.read().await.clone().ok_or(SessionError::PaneNotFound)?;
        self.mux.resize(&name, cols, rows).await.map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }

    pub async fn stop(&self, kill_mux: bool) -> Result<(), SessionError> {
        if let Some(name) = self.mux_name.read().await.clone() {
            if kill_mux {
                self.mux.kill_session(&name).await.map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
            }
        }
        let code = { self.state.read().await.status };
        self.emit(SessionEvent::Exit { status: code });
        Ok(())
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn light_snapshot(&self) -> LightSessionState {
        self.state.read().await.to_light(self.id, self.mode)
    }

    pub async fn name(&self) -> String {
        self.name.read().await.clone()
    }

    pub async fn set_name(&self, name: String) {
        *self.name.write().await = name;
    }

    pub async fn mux_name(&self) -> Option<String> {
        self.mux_name.read().await.clone()
    }

    pub(crate) fn profile(&self) -> &dyn ModeProfile {
        self.profile.as_ref()
    }

    pub(crate) fn buffers(&self) -> &RwLock<SessionBuffers> {
        &self.buffers
    }

    pub(crate) fn state(&self) -> &RwLock<SessionState> {
        &self.state
    }

    pub(crate) fn progress(&self) -> &Mutex<ProgressParser> {
        &self.progress
    }

    pub(crate) fn breaker(&self) -> &Mutex<CircuitBreaker> {
        &self.breaker
    }

    pub(crate) fn emit_event(&self, event: SessionEvent) {
        self.emit(event);
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
