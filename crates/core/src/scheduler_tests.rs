// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

#[tokio::test]
async fn fires_once_after_delay() {
    let scheduler: Arc<KeyedScheduler<&'static str>> = KeyedScheduler::new();
    let count = Arc::new(AtomicU32::new(0));
    let c = count.clone();
    scheduler
        .schedule("a", Duration::from_millis(10), move || {
            let c = c.clone();
            Box::pin(async move {
                c.fetch_add(1, Ordering::SeqCst);
            })
        })
        .await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rescheduling_same_key_cancels_previous() {
    let scheduler: Arc<KeyedScheduler<&'static str>> = KeyedScheduler::new();
    let count = Arc::new(AtomicU32::new(0));
    let c1 = count.clone();
    scheduler
        .schedule("a", Duration::from_millis(10), move || {
            let c1 = c1.clone();
            Box::pin(async move {
                c1.fetch_add(1, Ordering::SeqCst);
            })
        })
        .await;
    let c2 = count.clone();
    scheduler
        .schedule("a", Duration::from_millis(40), move || {
            let c2 = c2.clone();
            Box::pin(async move {
                c2.fetch_add(10, Ordering::SeqCst);
            })
        })
        .await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(count.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn cancel_all_prevents_callbacks() {
    let scheduler: Arc<KeyedScheduler<&'static str>> = KeyedScheduler::new();
    let count = Arc::new(AtomicU32::new(0));
    let c = count.clone();
    scheduler
        .schedule("a", Duration::from_millis(10), move || {
            let c = c.clone();
            Box::pin(async move {
                c.fetch_add(1, Ordering::SeqCst);
            })
        })
        .await;
    scheduler.cancel_all().await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
