// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("it's"), "'it'\\''s'");
}

#[test]
fn shell_quote_join_preserves_argument_boundaries() {
    let argv = vec!["claude".to_string(), "--model".to_string(), "opus".to_string()];
    assert_eq!(shell_quote_join(&argv), "'claude' '--model' 'opus'");
}

#[test]
fn shell_quote_neutralizes_command_injection_attempt() {
    let hostile = "x'; rm -rf ~; echo '";
    let quoted = shell_quote(hostile);
    // The quoted form must not contain an unescaped closing quote followed
    // directly by a shell metacharacter sequence from the input.
    assert!(quoted.starts_with('\''));
    assert!(quoted.ends_with('\''));
    assert!(quoted.contains("'\\''"));
}
