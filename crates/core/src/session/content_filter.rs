// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strips cursor movement, screen-mode toggles, mouse sequences,
//! erase-display/line, and SGR from a PTY chunk, leaving only the bytes
//! that represent an actual content change. Used to decide whether
//! `lastActivityAt` should advance for continuously-redrawing TUIs.

use std::sync::LazyLock;

use regex::bytes::Regex;

// Patterns below are compile-time literals; `expect` only fires on a typo
// caught by the test suite, never on runtime input.
#[allow(clippy::expect_used)]
static CSI: LazyLock<Regex> = LazyLock::new(|| {
    // CSI sequences: ESC [ params letter. Covers cursor movement, erase,
    // SGR, and private-mode toggles (the `?` variant used for e.g. mouse
    // reporting and alt-screen).
    Regex::new(r"(?s)\x1b\[[0-9;?]*[A-Za-z]").expect("static CSI regex")
});

#[allow(clippy::expect_used)]
static OSC: LazyLock<Regex> = LazyLock::new(|| {
    // OSC sequences: ESC ] ... BEL or ESC \.
    Regex::new(r"(?s)\x1b\][^\x07]*(\x07|\x1b\\)").expect("static OSC regex")
});

#[allow(clippy::expect_used)]
static SIMPLE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    // Other two-byte escapes (e.g. ESC 7 / ESC 8 save/restore cursor, ESC = / >).
    Regex::new(r"\x1b[0-9A-Za-z=>]").expect("static escape regex")
});

/// Remove the non-content escape sequences from `chunk` and return the
/// remaining bytes as a lossy UTF-8 string.
pub fn strip_ansi(chunk: &[u8]) -> String {
    let step1 = OSC.replace_all(chunk, &b""[..]);
    let step2 = CSI.replace_all(&step1, &b""[..]);
    let step3 = SIMPLE_ESCAPE.replace_all(&step2, &b""[..]);
    String::from_utf8_lossy(&step3).into_owned()
}

/// True if, after stripping and trimming, any meaningful text remains.
pub fn is_content_change(chunk: &[u8]) -> bool {
    !strip_ansi(chunk).trim().is_empty()
}

#[cfg(test)]
#[path = "content_filter_tests.rs"]
mod tests;
