// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mode-specific behavior, expressed as a capability set rather than
//! `if mode == "x"` branches scattered through [`super::Session`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Claude,
    OpenCode,
    Shell,
}

/// Inputs a [`ModeProfile`] needs to classify one chunk of filtered text.
pub struct DetectContext<'a> {
    /// The filtered (ANSI-stripped) text of the current chunk.
    pub filtered_text: &'a str,
    /// Milliseconds since the buffer last changed content, before this chunk.
    pub quiet_for_ms: i64,
    pub was_idle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityVerdict {
    Idle,
    Busy,
    Unchanged,
}

/// Per-mode capability set. Implementations hold no session state; they are
/// pure classifiers the pipeline consults.
pub trait ModeProfile: Send + Sync {
    fn mode(&self) -> Mode;

    /// Whether this mode's output should be run through the (comparatively
    /// expensive) progress parser and token extraction.
    fn parses_progress(&self) -> bool;

    /// Silence threshold before the prompt-char/content-silence detector
    /// considers the session idle.
    fn idle_timeout_ms(&self) -> i64;

    /// Classify one chunk's effect on activity state.
    fn classify(&self, ctx: DetectContext<'_>) -> ActivityVerdict;

    /// Extract `{input_tokens, output_tokens}` deltas from a status line,
    /// if this mode exposes one. Returns `None` when absent.
    fn parse_tokens(&self, _filtered_text: &str) -> Option<(u64, u64)> {
        None
    }
}

pub fn profile_for(mode: Mode) -> Box<dyn ModeProfile> {
    match mode {
        Mode::Claude => Box::new(ClaudeMode),
        Mode::OpenCode => Box::new(OpenCodeMode),
        Mode::Shell => Box::new(ShellMode),
    }
}

const PROMPT_CHAR: char = '\u{276F}'; // ❯

// Patterns below are compile-time literals known valid at build time; the
// `expect` only ever fires on a typo caught by the test suite, never on
// runtime input.
#[allow(clippy::expect_used)]
static WORKING_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)esc to interrupt|thinking|working").expect("static working-keyword regex")
});

#[allow(clippy::expect_used)]
static TOKEN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)k?\s*tokens").expect("static token-line regex")
});

const BRAILLE_SPINNER: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];

/// Claude Code: prompt-char idle detection plus a known spinner/keyword set
/// for "working", and a status-line token count.
pub struct ClaudeMode;

impl ModeProfile for ClaudeMode {
    fn mode(&self) -> Mode {
        Mode::Claude
    }

    fn parses_progress(&self) -> bool {
        true
    }

    fn idle_timeout_ms(&self) -> i64 {
        3_000
    }

    fn classify(&self, ctx: DetectContext<'_>) -> ActivityVerdict {
        let trimmed = ctx.filtered_text.trim_end();
        let ends_with_prompt = trimmed.ends_with(PROMPT_CHAR);
        let has_spinner = ctx.filtered_text.chars().any(|c| BRAILLE_SPINNER.contains(&c));
        let has_keyword = WORKING_KEYWORDS.is_match(ctx.filtered_text);

        if has_spinner || has_keyword {
            return ActivityVerdict::Busy;
        }
        if ends_with_prompt && ctx.quiet_for_ms >= 2_000 {
            return ActivityVerdict::Idle;
        }
        ActivityVerdict::Unchanged
    }

    fn parse_tokens(&self, filtered_text: &str) -> Option<(u64, u64)> {
        let caps = TOKEN_LINE.captures(filtered_text)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let tokens = (value * 1000.0) as u64;
        // The status line reports a combined figure; without a finer
        // breakdown we attribute it to output tokens, the dominant share
        // during active generation.
        Some((0, tokens))
    }
}

/// OpenCode: no prompt character, no progress parser. Idle/busy is purely
/// silence-based against a longer threshold (TUI redraws are noisier).
pub struct OpenCodeMode;

impl ModeProfile for OpenCodeMode {
    fn mode(&self) -> Mode {
        Mode::OpenCode
    }

    fn parses_progress(&self) -> bool {
        false
    }

    fn idle_timeout_ms(&self) -> i64 {
        8_000
    }

    fn classify(&self, ctx: DetectContext<'_>) -> ActivityVerdict {
        if ctx.was_idle && ctx.quiet_for_ms == 0 {
            return ActivityVerdict::Busy;
        }
        if !ctx.was_idle && ctx.quiet_for_ms > self.idle_timeout_ms() {
            return ActivityVerdict::Idle;
        }
        ActivityVerdict::Unchanged
    }
}

/// Plain shell: no agent-specific parsing at all, pure PTY proxy.
pub struct ShellMode;

impl ModeProfile for ShellMode {
    fn mode(&self) -> Mode {
        Mode::Shell
    }

    fn parses_progress(&self) -> bool {
        false
    }

    fn idle_timeout_ms(&self) -> i64 {
        i64::MAX
    }

    fn classify(&self, _ctx: DetectContext<'_>) -> ActivityVerdict {
        ActivityVerdict::Unchanged
    }
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;
