// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed event vocabularies. Re-expresses the source's string-keyed event
//! emitters as tagged enums: unknown events are unrepresentable.

use serde::{Deserialize, Serialize};

use crate::progress::{CircuitBreakerStatus, StatusBlock};
use crate::session::{LightSessionState, SessionId, SessionStatus};

/// Events a single [`crate::session::Session`] emits to its subscribers
/// (the respawn controller and, via the supervisor, the event bus).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    Started,
    Terminal { bytes: Vec<u8> },
    ClearTerminal,
    NeedsRefresh,
    Message { value: serde_json::Value },
    Error { message: String },
    Completion { cost: f64 },
    Exit { status: SessionStatus },
    Idle,
    Working,
    AutoClear,
    AutoCompact,
    StatusBlock { block: StatusBlock },
    CircuitBreakerUpdate { status: CircuitBreakerStatus },
    ExitGateMet,
}

/// Top-level events the supervisor fans out over the event bus. Only the
/// `Session*` lifecycle variants invalidate the light-state/session-list
/// caches (see `SPEC_FULL.md` §4.3).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BusEvent {
    SessionCreated { session: LightSessionState },
    SessionUpdated { session: LightSessionState },
    SessionDeleted { id: SessionId },
    SessionTerminal { id: SessionId, bytes: Vec<u8> },
    SessionState { id: SessionId, inner: SessionEvent },
    RespawnStarted { id: SessionId },
    RespawnCycle { id: SessionId, cycle: u64, state: String },
    RespawnBlocked { id: SessionId, reason: String },
    ServerShutdown,
    Heartbeat,
}

impl BusEvent {
    /// Whether this event should invalidate the light-state/session-list
    /// caches (only the three lifecycle events do; high-frequency
    /// transitions ride the debounced `SessionUpdated` instead).
    pub fn invalidates_cache(&self) -> bool {
        matches!(self, BusEvent::SessionCreated { .. } | BusEvent::SessionUpdated { .. } | BusEvent::SessionDeleted { .. })
    }

    /// The session id this event pertains to, if any (used to key
    /// per-session batching/debouncing).
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            BusEvent::SessionCreated { session } | BusEvent::SessionUpdated { session } => Some(session.id),
            BusEvent::SessionDeleted { id }
            | BusEvent::SessionTerminal { id, .. }
            | BusEvent::SessionState { id, .. }
            | BusEvent::RespawnStarted { id }
            | BusEvent::RespawnCycle { id, .. }
            | BusEvent::RespawnBlocked { id, .. } => Some(*id),
            BusEvent::ServerShutdown | BusEvent::Heartbeat => None,
        }
    }
}

/// Closed vocabulary of hook-ingress events (`SPEC_FULL.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEventKind {
    IdlePrompt,
    PermissionPrompt,
    ElicitationDialog,
    Stop,
    TeammateIdle,
    TaskCompleted,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HookEvent {
    pub event: HookEventKind,
    pub session_id: SessionId,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}
