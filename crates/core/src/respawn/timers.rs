// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named, cancellable timers for one respawn controller. A state
//! transition cancels every timer from the previous state before arming
//! the next one's (the invariant `SPEC_FULL.md` §4.4 calls out).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Fired when a named timer elapses without being cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerName {
    ConfirmIdle,
    AiCheck,
    WaitUpdate,
    InterStep,
    WaitInit,
    WaitKickstart,
    AutoAccept,
    Duration,
}

pub struct TimerWheel {
    handles: Mutex<HashMap<TimerName, JoinHandle<()>>>,
    fired_tx: mpsc::Sender<TimerName>,
}

impl TimerWheel {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<TimerName>) {
        let (fired_tx, fired_rx) = mpsc::channel(16);
        (Arc::new(Self { handles: Mutex::new(HashMap::new()), fired_tx }), fired_rx)
    }

    /// Re-arm `name`, replacing any pending timer under the same name.
    pub async fn schedule(&self, name: TimerName, delay: Duration) {
        self.cancel(name).await;
        let tx = self.fired_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(name).await;
        });
        self.handles.lock().await.insert(name, handle);
    }

    pub async fn cancel(&self, name: TimerName) {
        if let Some(handle) = self.handles.lock().await.remove(&name) {
            handle.abort();
        }
    }

    /// Cancel every pending timer. Called on every state transition so no
    /// timer from the previous state survives into the next.
    pub async fn cancel_all(&self) {
        let mut handles = self.handles.lock().await;
        for (_, handle) in handles.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
