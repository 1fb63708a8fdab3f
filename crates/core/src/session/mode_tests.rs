// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn claude_prompt_char_with_dwell_is_idle() {
    let profile = ClaudeMode;
    let ctx = DetectContext { filtered_text: "❯ ", quiet_for_ms: 2_500, was_idle: false };
    assert_eq!(profile.classify(ctx), ActivityVerdict::Idle);
}

#[test]
fn claude_spinner_is_busy_even_with_dwell() {
    let profile = ClaudeMode;
    let ctx = DetectContext { filtered_text: "⠋ thinking", quiet_for_ms: 5_000, was_idle: false };
    assert_eq!(profile.classify(ctx), ActivityVerdict::Busy);
}

#[test]
fn claude_parses_token_status_line() {
    let profile = ClaudeMode;
    let (_, out) = profile.parse_tokens("12.3k tokens used so far").unwrap();
    assert_eq!(out, 12_300);
}

#[test]
fn opencode_never_parses_progress() {
    assert!(!OpenCodeMode.parses_progress());
}

#[test]
fn opencode_silence_past_threshold_is_idle() {
    let profile = OpenCodeMode;
    let ctx = DetectContext { filtered_text: "", quiet_for_ms: 9_000, was_idle: false };
    assert_eq!(profile.classify(ctx), ActivityVerdict::Idle);
}

#[test]
fn shell_never_classifies_activity() {
    let profile = ShellMode;
    let ctx = DetectContext { filtered_text: "anything", quiet_for_ms: 999_999, was_idle: true };
    assert_eq!(profile.classify(ctx), ActivityVerdict::Unchanged);
}
