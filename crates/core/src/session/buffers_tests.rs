// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn terminal_buffer_trims_and_keeps_tail() {
    let mut buf = SessionBuffers::default();
    let chunk = vec![b'a'; TERMINAL_CAP + (512 * 1024)];
    buf.push_terminal(&chunk);
    assert!(buf.terminal.len() <= TERMINAL_CAP);
    assert!(buf.terminal.len() >= TERMINAL_TRIM - 1);
}

#[test]
fn text_buffer_never_splits_utf8() {
    let mut buf = SessionBuffers::default();
    let chunk = "é".repeat((TEXT_CAP / 2) + 10_000);
    buf.push_text(&chunk);
    assert!(std::str::from_utf8(buf.text_output.as_bytes()).is_ok());
}

#[test]
fn messages_trim_to_800_from_front() {
    let mut buf = SessionBuffers::default();
    for i in 0..1200 {
        buf.push_message(serde_json::json!({ "i": i }));
    }
    assert_eq!(buf.messages.len(), MESSAGES_TRIM);
    assert_eq!(buf.messages.front().unwrap()["i"], 400);
}
