// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mux::PaneRecord;
use crate::respawn::RespawnConfig;
use crate::session::{Mode, SessionFlags, SessionId};

/// On-disk record of everything needed to rebuild a [`crate::session::Session`]
/// after a supervisor restart, short of the live PTY attach and buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub id: SessionId,
    pub mode: Mode,
    pub working_dir: PathBuf,
    pub name: String,
    pub color: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub flags: SessionFlags,
    pub respawn_config: Option<RespawnConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsFile {
    pub sessions: Vec<PersistedSession>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanesFile {
    pub panes: Vec<PersistedPane>,
}

/// Persisted counterpart of a [`PaneRecord`], keyed by session id so
/// reconciliation can match it against live multiplexer panes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPane {
    pub session_id: SessionId,
    pub mux_name: String,
}

impl PersistedPane {
    pub fn matches(&self, live: &PaneRecord) -> bool {
        self.mux_name == live.mux_name
    }
}

/// Cumulative tally, updated only on `cleanupSession(killMux=true)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub sessions_completed: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
}
