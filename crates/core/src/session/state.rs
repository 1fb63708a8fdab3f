// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use super::{Mode, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Busy,
    Stopped,
    Error,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionFlags {
    pub auto_clear_enabled: bool,
    pub auto_clear_threshold: usize,
    pub auto_compact_enabled: bool,
    pub auto_compact_threshold: usize,
    pub image_watcher_enabled: bool,
    pub flicker_filter_enabled: bool,
}

/// Full mutable state of a session, as owned by the supervisor. `to_light`
/// produces the cheaper broadcast/cache variant (no buffers either way —
/// those live separately in [`super::SessionBuffers`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub last_activity_at: i64,
    pub flags: SessionFlags,
}

impl SessionState {
    pub fn to_light(&self, id: SessionId, mode: Mode) -> LightSessionState {
        LightSessionState {
            id,
            mode,
            status: self.status,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            total_cost: self.total_cost,
        }
    }
}

/// Cheap broadcast/cache snapshot — no buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightSessionState {
    pub id: SessionId,
    pub mode: Mode,
    pub status: SessionStatus,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
}
