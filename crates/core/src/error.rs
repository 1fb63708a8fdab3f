// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-subsystem error enums and the umbrella [`SupervisorError`] the public
//! API returns. Translation to a wire envelope happens only at the
//! server-glue edge (`keeperd::transport::error`), never in here.

use crate::session::SessionId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,
    #[error("session is busy")]
    Busy,
    #[error("pane not found for session")]
    PaneNotFound,
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
    #[error("pty io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("multiplexer session not found")]
    NotFound,
    #[error("multiplexer command failed: {0}")]
    CommandFailed(String),
    #[error("multiplexer binary not available: {0}")]
    BinaryMissing(String),
    #[error("io error talking to multiplexer: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RespawnError {
    #[error("respawn controller already running")]
    AlreadyRunning,
    #[error("respawn controller stopped: {0}")]
    Stopped(String),
    #[error("invalid respawn config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("status block missing required STATUS field")]
    MissingStatus,
    #[error("status block had an unterminated block")]
    Unterminated,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize persisted state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write persisted state: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("too many subscribers (max {max})")]
    TooManySubscribers { max: usize },
    #[error("subscriber channel closed")]
    SubscriberGone,
}

/// Umbrella error returned by the supervisor's public API.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("session {id} not found")]
    NotFound { id: SessionId },
    #[error("too many sessions (max {max})")]
    TooManySessions { max: usize },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Mux(#[from] MuxError),
    #[error(transparent)]
    Respawn(#[from] RespawnError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Stable, closed error-kind classification used by the wire envelope.
/// Kept independent from the `Display` text so the edge can pick a code
/// without string-matching error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Capacity,
    InvalidInput,
    ResourceUnavailable,
    Busy,
    Internal,
}

impl SupervisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SupervisorError::NotFound { .. } => ErrorKind::NotFound,
            SupervisorError::TooManySessions { .. } => ErrorKind::Capacity,
            SupervisorError::Session(SessionError::AlreadyStarted) => ErrorKind::InvalidInput,
            SupervisorError::Session(SessionError::Busy) => ErrorKind::Busy,
            SupervisorError::Session(SessionError::PaneNotFound) => ErrorKind::ResourceUnavailable,
            SupervisorError::Session(SessionError::InvalidConfig(_)) => ErrorKind::InvalidInput,
            SupervisorError::Session(SessionError::Io(_)) => ErrorKind::ResourceUnavailable,
            SupervisorError::Mux(MuxError::NotFound) => ErrorKind::NotFound,
            SupervisorError::Mux(MuxError::BinaryMissing(_)) => ErrorKind::ResourceUnavailable,
            SupervisorError::Mux(_) => ErrorKind::ResourceUnavailable,
            SupervisorError::Respawn(RespawnError::AlreadyRunning) => ErrorKind::InvalidInput,
            SupervisorError::Respawn(_) => ErrorKind::InvalidInput,
            SupervisorError::Progress(_) => ErrorKind::InvalidInput,
            SupervisorError::Persist(_) => ErrorKind::Internal,
            SupervisorError::Bus(BusError::TooManySubscribers { .. }) => ErrorKind::Capacity,
            SupervisorError::Bus(_) => ErrorKind::Internal,
        }
    }
}
