// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn strips_cursor_movement_and_sgr() {
    let chunk = b"\x1b[2K\x1b[1;32mhello\x1b[0m\x1b[10;1H";
    assert_eq!(strip_ansi(chunk), "hello");
}

#[test]
fn pure_redraw_is_not_a_content_change() {
    let chunk = b"\x1b[2J\x1b[H\x1b[?25l  \x1b[?25h";
    assert!(!is_content_change(chunk));
}

#[test]
fn new_text_is_a_content_change() {
    let chunk = b"\x1b[2Kworking...";
    assert!(is_content_change(chunk));
}

#[test]
fn strips_osc_title_sequences() {
    let chunk = b"\x1b]0;my title\x07visible";
    assert_eq!(strip_ansi(chunk), "visible");
}
