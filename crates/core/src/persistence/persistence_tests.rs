// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::session::{Mode, SessionFlags, SessionId};

fn sample(id: SessionId) -> PersistedSession {
    PersistedSession {
        id,
        mode: Mode::Claude,
        working_dir: std::env::temp_dir(),
        name: "demo".to_string(),
        color: "red".to_string(),
        input_tokens: 10,
        output_tokens: 20,
        total_cost: 0.5,
        flags: SessionFlags::default(),
        respawn_config: None,
    }
}

#[tokio::test]
async fn upsert_is_debounced_then_readable_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistStore::open(dir.path().to_path_buf()).await.unwrap();
    let id = SessionId::new();
    store.upsert_session(sample(id)).await;

    tokio::time::sleep(Duration::from_millis(250)).await;

    let reopened = PersistStore::open(dir.path().to_path_buf()).await.unwrap();
    let sessions = reopened.loaded_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, id);
}

#[tokio::test]
async fn flush_all_writes_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistStore::open(dir.path().to_path_buf()).await.unwrap();
    let id = SessionId::new();
    store.upsert_session(sample(id)).await;
    store.flush_all().await;

    let raw = tokio::fs::read_to_string(dir.path().join("sessions.json")).await.unwrap();
    assert!(raw.contains(&id.to_string()));
}

#[tokio::test]
async fn corrupt_file_recovers_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("sessions.json"), b"not json").await.unwrap();
    let store = PersistStore::open(dir.path().to_path_buf()).await.unwrap();
    assert!(store.loaded_sessions().await.is_empty());
}

#[tokio::test]
async fn lifetime_stats_accumulate() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistStore::open(dir.path().to_path_buf()).await.unwrap();
    store.accumulate_lifetime(100, 200, 1.5).await;
    store.accumulate_lifetime(50, 50, 0.5).await;
    store.flush_all().await;

    let reopened = PersistStore::open(dir.path().to_path_buf()).await.unwrap();
    let stats = reopened.stats.lock().await.clone();
    assert_eq!(stats.sessions_completed, 2);
    assert_eq!(stats.input_tokens, 150);
    assert_eq!(stats.total_cost, 2.0);
}
