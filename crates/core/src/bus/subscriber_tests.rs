// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::events::BusEvent;

#[tokio::test]
async fn delivers_events_in_order() {
    let (handle, mut sub) = SubscriberHandle::new(1);
    assert!(handle.try_send(BusEvent::Heartbeat));
    assert!(handle.try_send(BusEvent::ServerShutdown));

    assert!(matches!(sub.recv().await, Some(SubscriberMessage::Event(BusEvent::Heartbeat))));
    assert!(matches!(sub.recv().await, Some(SubscriberMessage::Event(BusEvent::ServerShutdown))));
}

#[tokio::test]
async fn full_queue_increments_dropped_without_blocking() {
    let (handle, mut sub) = SubscriberHandle::new(2);
    for _ in 0..SUBSCRIBER_CAPACITY {
        assert!(handle.try_send(BusEvent::Heartbeat));
    }
    assert!(!handle.try_send(BusEvent::Heartbeat));
    assert_eq!(sub.dropped_count(), 1);

    // The first recv after a drop is observed surfaces NeedsRefresh; the
    // event that proved the drain is queued and delivered right after.
    assert!(matches!(sub.recv().await, Some(SubscriberMessage::NeedsRefresh)));
    for _ in 0..SUBSCRIBER_CAPACITY {
        assert!(matches!(sub.recv().await, Some(SubscriberMessage::Event(BusEvent::Heartbeat))));
    }
}

#[tokio::test]
async fn drain_after_backpressure_emits_exactly_one_needs_refresh() {
    let (handle, mut sub) = SubscriberHandle::new(4);
    for _ in 0..SUBSCRIBER_CAPACITY {
        assert!(handle.try_send(BusEvent::Heartbeat));
    }
    assert!(!handle.try_send(BusEvent::Heartbeat));
    assert!(!handle.try_send(BusEvent::Heartbeat));
    assert_eq!(sub.dropped_count(), 2);

    let mut refreshes = 0;
    for _ in 0..SUBSCRIBER_CAPACITY {
        if matches!(sub.recv().await, Some(SubscriberMessage::NeedsRefresh)) {
            refreshes += 1;
        }
    }
    assert_eq!(refreshes, 1, "exactly one needsRefresh per drain, not one per dropped event");
}

#[tokio::test]
async fn closed_subscriber_reports_false() {
    let (handle, sub) = SubscriberHandle::new(3);
    drop(sub);
    assert!(handle.is_closed());
    assert!(!handle.try_send(BusEvent::Heartbeat));
}
