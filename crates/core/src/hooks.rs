// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook ingress (`SPEC_FULL.md` §6): a named pipe per session, newline-
//! delimited JSON, read through non-blocking I/O so reads stay cancellable.
//! Every event is validated against the closed [`HookEventKind`] vocabulary
//! and its payload sanitized before it ever reaches a [`RespawnController`].
//!
//! [`RespawnController`]: crate::respawn::RespawnController

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use nix::sys::stat::Mode as FifoMode;
use serde::Deserialize;
use tokio::io::unix::AsyncFd;

use crate::events::{HookEvent, HookEventKind};
use crate::session::SessionId;

/// Data keys an agent hook is allowed to attach; anything else is dropped
/// rather than passed through to a client.
const ALLOWED_DATA_KEYS: &[&str] = &["reason", "message", "tool_name", "task"];

/// A field longer than this is truncated — large payloads (a full tool
/// output, say) have no business riding the hook channel.
const MAX_FIELD_LEN: usize = 500;

struct FifoFd(OwnedFd);

impl AsRawFd for FifoFd {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.0.as_raw_fd()
    }
}

impl AsFd for FifoFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

#[derive(Deserialize)]
struct RawHookJson {
    event: String,
    #[serde(default)]
    session_id: Option<SessionId>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Reads structured hook events from one session's named pipe.
pub struct HookReceiver {
    session_id: SessionId,
    pipe_path: PathBuf,
    async_fd: Option<AsyncFd<FifoFd>>,
    line_buf: Vec<u8>,
}

impl HookReceiver {
    /// Create the named pipe at `pipe_path` for `session_id`'s hook ingress.
    pub fn new(session_id: SessionId, pipe_path: &Path) -> anyhow::Result<Self> {
        nix::unistd::mkfifo(pipe_path, FifoMode::from_bits_truncate(0o600))?;
        Ok(Self { session_id, pipe_path: pipe_path.to_path_buf(), async_fd: None, line_buf: Vec::with_capacity(4096) })
    }

    pub fn pipe_path(&self) -> &Path {
        &self.pipe_path
    }

    /// Read the next validated hook event, or `None` on EOF/unrecoverable
    /// error. Lines that don't parse, name an unknown event, or carry a
    /// mismatched `session_id` are skipped rather than surfaced.
    pub async fn next_event(&mut self) -> Option<HookEvent> {
        self.ensure_fd().ok()?;
        loop {
            if let Some(event) = self.try_parse_line() {
                return Some(event);
            }
            let afd = self.async_fd.as_ref()?;
            let mut guard = afd.readable().await.ok()?;
            let mut buf = [0u8; 4096];
            match guard.try_io(|inner| {
                nix::unistd::read(inner.get_ref(), &mut buf).map_err(|e| std::io::Error::from_raw_os_error(e as i32))
            }) {
                Ok(Ok(0)) => return None,
                Ok(Ok(n)) => self.line_buf.extend_from_slice(&buf[..n]),
                Ok(Err(_)) => return None,
                Err(_would_block) => continue,
            }
        }
    }

    fn try_parse_line(&mut self) -> Option<HookEvent> {
        loop {
            let pos = self.line_buf.iter().position(|&b| b == b'\n')?;
            let line = String::from_utf8_lossy(&self.line_buf[..pos]).to_string();
            self.line_buf.drain(..=pos);
            if let Some(event) = self.parse_and_validate(line.trim()) {
                return Some(event);
            }
        }
    }

    fn parse_and_validate(&self, line: &str) -> Option<HookEvent> {
        let raw: RawHookJson = serde_json::from_str(line).ok()?;
        if let Some(claimed) = raw.session_id {
            if claimed != self.session_id {
                tracing::warn!(session = %self.session_id, claimed = %claimed, "hook line claimed a different session, dropping");
                return None;
            }
        }
        let event = classify(&raw.event)?;
        Some(HookEvent { event, session_id: self.session_id, data: raw.data.map(|d| sanitize(&d)) })
    }

    fn ensure_fd(&mut self) -> anyhow::Result<()> {
        if self.async_fd.is_none() {
            let std_file = std::fs::OpenOptions::new().read(true).write(true).open(&self.pipe_path)?;
            set_nonblocking(&std_file)?;
            let owned: OwnedFd = std_file.into();
            self.async_fd = Some(AsyncFd::new(FifoFd(owned))?);
        }
        Ok(())
    }
}

impl Drop for HookReceiver {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.pipe_path);
    }
}

fn set_nonblocking(file: &std::fs::File) -> anyhow::Result<()> {
    use std::os::fd::AsRawFd;
    let fd = file.as_raw_fd();
    let flags = nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_GETFL)?;
    let mut flags = nix::fcntl::OFlag::from_bits_truncate(flags);
    flags.insert(nix::fcntl::OFlag::O_NONBLOCK);
    nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_SETFL(flags))?;
    Ok(())
}

fn classify(raw_event: &str) -> Option<HookEventKind> {
    match raw_event {
        "idle_prompt" | "waiting_for_input" => Some(HookEventKind::IdlePrompt),
        "permission_prompt" | "pre_tool_use_confirm" => Some(HookEventKind::PermissionPrompt),
        "elicitation_dialog" | "notification" => Some(HookEventKind::ElicitationDialog),
        "stop" => Some(HookEventKind::Stop),
        "teammate_idle" => Some(HookEventKind::TeammateIdle),
        "task_completed" | "subagent_stop" => Some(HookEventKind::TaskCompleted),
        _ => None,
    }
}

/// Drop any data key not on the allowlist and truncate long string values.
fn sanitize(data: &serde_json::Value) -> serde_json::Value {
    let Some(obj) = data.as_object() else { return serde_json::Value::Null };
    let mut out = serde_json::Map::new();
    for key in ALLOWED_DATA_KEYS {
        if let Some(value) = obj.get(*key) {
            out.insert((*key).to_string(), truncate_value(value));
        }
    }
    serde_json::Value::Object(out)
}

fn truncate_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) if s.len() > MAX_FIELD_LEN => {
            let mut truncated = s.clone();
            let mut end = MAX_FIELD_LEN;
            while end < truncated.len() && !truncated.is_char_boundary(end) {
                end += 1;
            }
            truncated.truncate(end);
            serde_json::Value::String(truncated)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
