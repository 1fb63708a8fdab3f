// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tmux`-backed [`MultiplexerAdapter`]. Every call reaches the real
//! `tmux` binary through an argv array (`tokio::process::Command`) — never
//! a `sh -c` string — so no user-controlled value (model name, session id,
//! JSON blob) is ever subject to shell interpretation.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::process::Command;

use crate::error::MuxError;

use super::{CreateSessionOpts, CreatedSession, MultiplexerAdapter, PaneRecord, PaneStats, RespawnOpts};

pub struct TmuxAdapter {
    tmux_bin: PathBuf,
}

impl TmuxAdapter {
    pub fn new() -> Self {
        Self { tmux_bin: PathBuf::from("tmux") }
    }

    pub fn with_binary(tmux_bin: impl Into<PathBuf>) -> Self {
        Self { tmux_bin: tmux_bin.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String, MuxError> {
        let output = Command::new(&self.tmux_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| MuxError::BinaryMissing(e.to_string()))?;
        if !output.status.success() {
            return Err(MuxError::CommandFailed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TmuxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiplexerAdapter for TmuxAdapter {
    fn create_session(
        &self,
        opts: CreateSessionOpts,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedSession, MuxError>> + Send + '_>> {
        Box::pin(async move {
            let mux_name = format!("keeper-{}", opts.session_id);
            let cwd = opts.working_dir.to_string_lossy().into_owned();
            let cols = opts.cols.to_string();
            let rows = opts.rows.to_string();

            self.run(&["new-session", "-d", "-s", &mux_name, "-c", &cwd, "-x", &cols, "-y", &rows]).await?;
            self.run(&["set-option", "-t", &mux_name, "remain-on-exit", "on"]).await?;

            for (key, value) in &opts.env {
                self.run(&["set-environment", "-t", &mux_name, key, value]).await?;
            }

            if !opts.command.is_empty() {
                let joined = shell_quote_join(&opts.command);
                self.run(&["respawn-pane", "-k", "-t", &mux_name, &joined]).await?;
            }

            let pid = self.foreground_pid(&mux_name).await;
            Ok(CreatedSession { mux_name, pid })
        })
    }

    fn respawn_pane(
        &self,
        mux_name: &str,
        opts: RespawnOpts,
    ) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        let mux_name = mux_name.to_string();
        Box::pin(async move {
            for (key, value) in &opts.env {
                self.run(&["set-environment", "-t", &mux_name, key, value]).await?;
            }
            let joined = shell_quote_join(&opts.command);
            self.run(&["respawn-pane", "-k", "-t", &mux_name, &joined]).await?;
            Ok(())
        })
    }

    fn kill_session(&self, mux_name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        let mux_name = mux_name.to_string();
        Box::pin(async move {
            self.run(&["kill-session", "-t", &mux_name]).await?;
            Ok(())
        })
    }

    fn send_keys(&self, mux_name: &str, bytes: &[u8]) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        let mux_name = mux_name.to_string();
        let text = String::from_utf8_lossy(bytes).into_owned();
        Box::pin(async move {
            // Literal mode (`-l`): tmux does not interpret key names, the
            // bytes are sent verbatim.
            self.run(&["send-keys", "-t", &mux_name, "-l", "--", &text]).await?;
            Ok(())
        })
    }

    fn resize(&self, mux_name: &str, cols: u16, rows: u16) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        let mux_name = mux_name.to_string();
        let cols = cols.to_string();
        let rows = rows.to_string();
        Box::pin(async move {
            self.run(&["resize-window", "-t", &mux_name, "-x", &cols, "-y", &rows]).await?;
            Ok(())
        })
    }

    fn update_name(&self, mux_name: &str, name: &str) -> Pin<Box<dyn Future<Output = Result<(), MuxError>> + Send + '_>> {
        let mux_name = mux_name.to_string();
        let name = name.to_string();
        Box::pin(async move {
            self.run(&["rename-session", "-t", &mux_name, &name]).await?;
            Ok(())
        })
    }

    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<PaneRecord>, MuxError>> + Send + '_>> {
        Box::pin(async move {
            let out = match self.run(&["list-panes", "-a", "-F", "#{session_name} #{pane_pid} #{pane_current_command}"]).await {
                Ok(out) => out,
                // No server running means no panes — not a hard failure.
                Err(MuxError::CommandFailed(_)) => return Ok(Vec::new()),
                Err(e) => return Err(e),
            };
            Ok(out
                .lines()
                .filter_map(|line| {
                    let mut parts = line.splitn(3, ' ');
                    let mux_name = parts.next()?.to_string();
                    let pid = parts.next()?.parse::<i32>().ok();
                    let foreground_command = parts.next().map(|s| s.to_string());
                    Some(PaneRecord { mux_name, pid, foreground_command })
                })
                .collect())
        })
    }

    fn stats(&self, pid: i32) -> Pin<Box<dyn Future<Output = Option<PaneStats>> + Send + '_>> {
        Box::pin(async move { read_proc_stats(pid).await })
    }
}

impl TmuxAdapter {
    async fn foreground_pid(&self, mux_name: &str) -> Option<i32> {
        let out = self
            .run(&["list-panes", "-t", mux_name, "-F", "#{pane_pid}"])
            .await
            .ok()?;
        out.lines().next()?.trim().parse().ok()
    }
}

/// Join argv into a single string for `respawn-pane`, single-quoting each
/// argument (with `'\''` escaping) rather than interpolating raw. This is
/// the one place a command string is unavoidable (`respawn-pane` takes a
/// single shell command), so every argument is defensively quoted.
fn shell_quote_join(argv: &[String]) -> String {
    argv.iter().map(|arg| shell_quote(arg)).collect::<Vec<_>>().join(" ")
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

async fn read_proc_stats(pid: i32) -> Option<PaneStats> {
    let status = tokio::fs::read_to_string(format!("/proc/{pid}/status")).await.ok()?;
    let rss_kb = status
        .lines()
        .find(|l| l.starts_with("VmRSS:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    // CPU percent requires sampling /proc/<pid>/stat twice with a known
    // interval; startStatsCollection (the periodic caller) does that
    // differencing, so this single read reports 0 here by design.
    Some(PaneStats { cpu_percent: 0.0, rss_kb })
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
