// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// The 13-state respawn machine (`SPEC_FULL.md` §4.4). `Stopped` is the
/// absorbing terminal state: entered on explicit stop, breaker-open,
/// blocked status, duration expiry, or retry exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnState {
    Watching,
    ConfirmingIdle,
    AiChecking,
    SendingUpdate,
    WaitingUpdate,
    SendingClear,
    WaitingClear,
    SendingInit,
    WaitingInit,
    MonitoringInit,
    SendingKickstart,
    WaitingKickstart,
    Stopped,
}

/// Per-session configuration (`SPEC_FULL.md` §4.4 config table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespawnConfig {
    pub idle_timeout_ms: i64,
    pub update_prompt: String,
    pub inter_step_delay_ms: i64,
    pub send_clear: bool,
    pub send_init: bool,
    /// Empty string means "skip the kickstart step".
    pub kickstart_prompt: String,
    pub auto_accept_prompts: bool,
    pub auto_accept_delay_ms: i64,
    pub completion_confirm_ms: i64,
    pub no_output_timeout_ms: i64,
    pub ai_idle_check_enabled: bool,
    pub ai_idle_check_model: Option<String>,
    pub ai_idle_check_max_context: usize,
    pub ai_idle_check_timeout_ms: u64,
    pub ai_idle_check_cooldown_ms: i64,
    pub ai_plan_check_enabled: bool,
    pub duration_minutes: Option<u64>,
    pub max_update_retries: u32,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 3_000,
            update_prompt: "Please continue.".to_string(),
            inter_step_delay_ms: 500,
            send_clear: false,
            send_init: false,
            kickstart_prompt: String::new(),
            auto_accept_prompts: true,
            auto_accept_delay_ms: 1_000,
            completion_confirm_ms: 2_000,
            no_output_timeout_ms: 30_000,
            ai_idle_check_enabled: false,
            ai_idle_check_model: None,
            ai_idle_check_max_context: 4_000,
            ai_idle_check_timeout_ms: 10_000,
            ai_idle_check_cooldown_ms: 60_000,
            ai_plan_check_enabled: false,
            duration_minutes: None,
            max_update_retries: 3,
        }
    }
}

/// Reason a controller entered `Stopped`, surfaced on the `blocked` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Explicit,
    /// Circuit breaker tripped open on sustained no-progress; serializes as
    /// `no_progress_open` per the controller's stop-reason taxonomy.
    #[serde(rename = "no_progress_open")]
    NoProgressOpen,
    StatusBlocked,
    FatalError,
    PaneDead,
    DurationExpired,
    NoOutputRetriesExhausted,
    ExitGateMet,
}
