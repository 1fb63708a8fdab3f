// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event fan-out (`SPEC_FULL.md` §3): one [`EventBus`] per server process,
//! fanning every [`BusEvent`] out to all connected SSE clients with
//! per-subscriber backpressure, plus per-session terminal-data batching
//! wrapped in VT synchronized-update markers.

mod batcher;
mod subscriber;
mod sync_output;

pub use batcher::TerminalBatcher;
pub use subscriber::{Subscriber, SubscriberHandle, SubscriberMessage, SUBSCRIBER_CAPACITY};
pub use sync_output::wrap_batch;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::BusError;
use crate::events::BusEvent;
use crate::session::SessionId;

/// Hard cap on concurrently connected subscribers; past this new
/// connections are rejected rather than let fan-out degrade for everyone.
pub const MAX_SUBSCRIBERS: usize = 100;

/// Interval between liveness heartbeats, also the point at which closed
/// subscriber handles are swept out of the registry.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

pub struct EventBus {
    subscribers: Mutex<HashMap<u64, SubscriberHandle>>,
    next_id: AtomicU64,
    batcher: Arc<TerminalBatcher>,
    terminal_rx: Mutex<Option<mpsc::UnboundedReceiver<(SessionId, Vec<u8>)>>>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            batcher: TerminalBatcher::new(tx),
            terminal_rx: Mutex::new(Some(rx)),
        })
    }

    /// Register a new subscriber. Errors if `MAX_SUBSCRIBERS` is already
    /// connected.
    pub async fn subscribe(self: &Arc<Self>) -> Result<Subscriber, BusError> {
        let mut subscribers = self.subscribers.lock().await;
        if subscribers.len() >= MAX_SUBSCRIBERS {
            return Err(BusError::TooManySubscribers { max: MAX_SUBSCRIBERS });
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (handle, subscriber) = SubscriberHandle::new(id);
        subscribers.insert(id, handle);
        Ok(subscriber)
    }

    /// Fan `event` out to every connected subscriber, dropping it for any
    /// subscriber whose queue is full rather than blocking the publisher.
    pub async fn publish(&self, event: BusEvent) {
        let subscribers = self.subscribers.lock().await;
        for handle in subscribers.values() {
            handle.try_send(event.clone());
        }
    }

    /// Feed a chunk of raw terminal output for `session` into the batcher;
    /// once a batch window elapses the bus publishes a
    /// [`BusEvent::SessionTerminal`] wrapping the coalesced bytes.
    pub async fn push_terminal(self: &Arc<Self>, session: SessionId, chunk: Vec<u8>) {
        self.batcher.push(session, chunk).await;
    }

    pub async fn discard_session(self: &Arc<Self>, session: SessionId) {
        self.batcher.discard(session).await;
    }

    /// Drive the terminal-batch drain loop and periodic liveness sweep
    /// until cancelled. Spawned once at server startup.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let Some(mut terminal_rx) = self.terminal_rx.lock().await.take() else {
            tracing::warn!("EventBus::run called more than once, ignoring");
            return;
        };
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                Some((session, bytes)) = terminal_rx.recv() => {
                    self.publish(BusEvent::SessionTerminal { id: session, bytes: wrap_batch(&bytes) }).await;
                }
                _ = heartbeat.tick() => {
                    self.sweep_closed().await;
                    self.publish(BusEvent::Heartbeat).await;
                }
                _ = shutdown.cancelled() => {
                    self.publish(BusEvent::ServerShutdown).await;
                    break;
                }
            }
        }
    }

    async fn sweep_closed(&self) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|_, handle| !handle.is_closed());
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
