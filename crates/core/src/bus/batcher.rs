// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session terminal-data batching (`SPEC_FULL.md` §3.4). Built on the
//! same [`KeyedScheduler`] the persistence store uses for its write
//! debounce, keyed by session instead of by file.
//!
//! The flush window adapts to how hot a session's output is: a session
//! streaming many small writes per tick gets the short window so the
//! terminal feels live, a quiet session gets the long window so we don't
//! wake up the scheduler for nothing. A single write already at or past
//! the immediate-flush threshold skips the debounce and flushes inline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::scheduler::KeyedScheduler;
use crate::session::SessionId;

/// Above this many writes observed in the current window, treat the
/// session as hot and use the shortest flush window.
const HOT_WRITE_COUNT: u32 = 8;
/// Above this many, treat the session as warm.
const WARM_WRITE_COUNT: u32 = 2;

const WINDOW_HOT: Duration = Duration::from_millis(16);
const WINDOW_WARM: Duration = Duration::from_millis(32);
const WINDOW_COLD: Duration = Duration::from_millis(50);

/// A single write at or above this size flushes immediately, bypassing
/// the debounce entirely (a full screen redraw shouldn't wait).
const IMMEDIATE_FLUSH_BYTES: usize = 64 * 1024;

#[derive(Default)]
struct Pending {
    buf: Vec<u8>,
    writes: u32,
}

/// Coalesces rapid terminal writes for a session into batched flushes,
/// handed to `sink` as `(session, bytes)` pairs in arrival order.
pub struct TerminalBatcher {
    scheduler: Arc<KeyedScheduler<SessionId>>,
    pending: Mutex<HashMap<SessionId, Pending>>,
    sink: mpsc::UnboundedSender<(SessionId, Vec<u8>)>,
}

impl TerminalBatcher {
    pub fn new(sink: mpsc::UnboundedSender<(SessionId, Vec<u8>)>) -> Arc<Self> {
        Arc::new(Self { scheduler: KeyedScheduler::new(), pending: Mutex::new(HashMap::new()), sink })
    }

    /// Feed a chunk of raw terminal output for `session`.
    pub async fn push(self: &Arc<Self>, session: SessionId, chunk: Vec<u8>) {
        let immediate = chunk.len() >= IMMEDIATE_FLUSH_BYTES;
        let window = {
            let mut pending = self.pending.lock().await;
            let entry = pending.entry(session).or_default();
            entry.buf.extend_from_slice(&chunk);
            entry.writes += 1;
            if entry.writes > HOT_WRITE_COUNT {
                WINDOW_HOT
            } else if entry.writes > WARM_WRITE_COUNT {
                WINDOW_WARM
            } else {
                WINDOW_COLD
            }
        };

        if immediate {
            self.flush(session).await;
            return;
        }

        let this = Arc::clone(self);
        self.scheduler.schedule(session, window, move || Box::pin(async move { this.flush(session).await })).await;
    }

    /// Flush `session`'s accumulated buffer to the sink now, cancelling
    /// any pending timer for it.
    pub async fn flush(&self, session: SessionId) {
        self.scheduler.flush_key_cancel(&session).await;
        let drained = {
            let mut pending = self.pending.lock().await;
            pending.remove(&session)
        };
        let Some(pending) = drained else { return };
        if pending.buf.is_empty() {
            return;
        }
        let _ = self.sink.send((session, pending.buf));
    }

    /// Drop all pending state for a session without flushing, used when a
    /// session is torn down (its subscribers are gone too).
    pub async fn discard(&self, session: SessionId) {
        self.scheduler.flush_key_cancel(&session).await;
        self.pending.lock().await.remove(&session);
    }
}

#[cfg(test)]
#[path = "batcher_tests.rs"]
mod tests;
