// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single bus subscriber's channel and backpressure bookkeeping
//! (`SPEC_FULL.md` §3.4). Each SSE connection owns one [`Subscriber`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::events::BusEvent;

/// Bounded per-subscriber queue depth. Past this, a subscriber that can't
/// keep up starts losing events rather than letting one slow client stall
/// the whole fan-out.
pub const SUBSCRIBER_CAPACITY: usize = 256;

/// What [`Subscriber::recv`] hands back: either a real bus event, or a
/// one-shot instruction that the client missed events and should re-fetch
/// state rather than trust the delta stream (`SPEC_FULL.md` §4.3, §7
/// "Subscriber dead").
pub enum SubscriberMessage {
    Event(BusEvent),
    NeedsRefresh,
}

pub struct Subscriber {
    pub id: u64,
    rx: mpsc::Receiver<BusEvent>,
    dropped: Arc<AtomicU64>,
    last_seen_dropped: u64,
    queued_event: Option<BusEvent>,
}

impl Subscriber {
    /// Receives the next message, inserting exactly one [`SubscriberMessage::NeedsRefresh`]
    /// the first time a drain is observed after `dropped` grew — the event that
    /// proved the drain (successful `recv` despite pending drops) is queued
    /// and returned on the following call, so no event is lost.
    pub async fn recv(&mut self) -> Option<SubscriberMessage> {
        if let Some(event) = self.queued_event.take() {
            return Some(SubscriberMessage::Event(event));
        }
        let event = self.rx.recv().await?;
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.last_seen_dropped {
            self.last_seen_dropped = dropped;
            self.queued_event = Some(event);
            return Some(SubscriberMessage::NeedsRefresh);
        }
        Some(SubscriberMessage::Event(event))
    }

    /// Total events dropped for this subscriber since it joined, due to a
    /// full queue. A non-zero count means the client missed updates and
    /// should re-fetch full state rather than trust the delta stream.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Sender half retained by the bus; `try_send` never blocks the publisher,
/// a full queue just increments `dropped`.
pub struct SubscriberHandle {
    pub id: u64,
    tx: mpsc::Sender<BusEvent>,
    dropped: Arc<AtomicU64>,
}

impl SubscriberHandle {
    pub fn new(id: u64) -> (Self, Subscriber) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let dropped = Arc::new(AtomicU64::new(0));
        (Self { id, tx, dropped: Arc::clone(&dropped) }, Subscriber { id, rx, dropped, last_seen_dropped: 0, queued_event: None })
    }

    /// Non-blocking publish. Returns `false` if the subscriber's queue was
    /// full (event dropped) or the subscriber has gone away.
    pub fn try_send(&self, event: BusEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
