// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::Mode;
use crate::test_support::started_session;

#[tokio::test]
async fn send_update_writes_prompt_and_bumps_cycle() {
    let (session, mux) = started_session(Mode::Shell).await;
    let controller = RespawnController::new(session, RespawnConfig::default(), None);
    *controller.state.write().await = RespawnState::Watching;

    controller.do_send_update().await;

    assert_eq!(controller.cycle_count(), 1);
    assert_eq!(controller.state().await, RespawnState::WaitingUpdate);
    let sent = mux.sent_keys.lock().await;
    assert_eq!(sent.len(), 1);
    assert!(String::from_utf8_lossy(&sent[0]).contains("Please continue."));
}

#[tokio::test]
async fn stop_with_reason_is_absorbing() {
    let (session, _mux) = started_session(Mode::Shell).await;
    let controller = RespawnController::new(session, RespawnConfig::default(), None);
    *controller.state.write().await = RespawnState::Watching;

    let mut events = controller.subscribe();
    controller.stop_with_reason(StopReason::PaneDead).await;

    assert_eq!(controller.state().await, RespawnState::Stopped);
    let event = events.recv().await.unwrap();
    assert!(matches!(event, RespawnEvent::Blocked(StopReason::PaneDead)));
}

#[tokio::test]
async fn elicitation_suppresses_auto_accept() {
    let (session, mux) = started_session(Mode::Shell).await;
    let controller = RespawnController::new(session, RespawnConfig::default(), None);
    controller.on_hook_event(HookEventKind::ElicitationDialog).await;
    controller.on_hook_event(HookEventKind::PermissionPrompt).await;
    // No auto-accept timer should have been armed; give it a moment either way.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(mux.sent_keys.lock().await.is_empty());
}

#[tokio::test]
async fn update_retries_exhaust_into_stopped() {
    let (session, _mux) = started_session(Mode::Shell).await;
    let mut config = RespawnConfig::default();
    config.max_update_retries = 1;
    let controller = RespawnController::new(session, config, None);
    *controller.state.write().await = RespawnState::WaitingUpdate;

    controller.on_wait_update_timeout().await;

    assert_eq!(controller.state().await, RespawnState::Stopped);
}
