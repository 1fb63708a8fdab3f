// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::sync::mpsc;

use super::*;

#[tokio::test]
async fn coalesces_rapid_writes_into_one_flush() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let batcher = TerminalBatcher::new(tx);
    let session = SessionId::new();

    for _ in 0..5 {
        batcher.push(session, b"x".to_vec()).await;
    }

    let (got_session, bytes) = rx.recv().await.unwrap();
    assert_eq!(got_session, session);
    assert_eq!(bytes, b"xxxxx");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn large_write_flushes_immediately() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let batcher = TerminalBatcher::new(tx);
    let session = SessionId::new();

    let huge = vec![b'a'; IMMEDIATE_FLUSH_BYTES];
    batcher.push(session, huge.clone()).await;

    let (_, bytes) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.unwrap().unwrap();
    assert_eq!(bytes, huge);
}

#[tokio::test]
async fn discard_drops_pending_without_flushing() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let batcher = TerminalBatcher::new(tx);
    let session = SessionId::new();

    batcher.push(session, b"partial".to_vec()).await;
    batcher.discard(session).await;

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(rx.try_recv().is_err());
}
