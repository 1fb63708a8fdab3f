// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[tokio::test]
async fn fires_after_delay() {
    let (wheel, mut fired) = TimerWheel::new();
    wheel.schedule(TimerName::ConfirmIdle, Duration::from_millis(20)).await;
    let name = tokio::time::timeout(Duration::from_millis(200), fired.recv()).await.unwrap().unwrap();
    assert_eq!(name, TimerName::ConfirmIdle);
}

#[tokio::test]
async fn rescheduling_cancels_the_previous_timer() {
    let (wheel, mut fired) = TimerWheel::new();
    wheel.schedule(TimerName::WaitUpdate, Duration::from_millis(20)).await;
    wheel.schedule(TimerName::WaitUpdate, Duration::from_millis(200)).await;
    // Only the second, longer-delay timer should ever fire.
    let result = tokio::time::timeout(Duration::from_millis(60), fired.recv()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn cancel_all_prevents_any_pending_timer_from_firing() {
    let (wheel, mut fired) = TimerWheel::new();
    wheel.schedule(TimerName::ConfirmIdle, Duration::from_millis(20)).await;
    wheel.schedule(TimerName::WaitUpdate, Duration::from_millis(20)).await;
    wheel.cancel_all().await;
    let result = tokio::time::timeout(Duration::from_millis(100), fired.recv()).await;
    assert!(result.is_err());
}
