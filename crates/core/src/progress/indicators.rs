// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Natural-language completion indicators: phrases the agent emits outside
//! a structured status block that still count toward the exit gate.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^\s*(all )?(tasks?|tests?) (complete|completed|passing)\b",
        r"(?i)\btask (is |has been )?(complete|done|finished)\b",
        r"(?i)\beverything (is |looks )?(working|done|complete)\b",
        r"(?i)^\s*done[.!]?\s*$",
        r"(?i)\bimplementation (is )?complete\b",
        r"(?i)\bno (further|more) (action|changes?) (needed|required)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static completion-indicator regex"))
    .collect()
});

/// True if `line` matches a known natural-language completion indicator.
pub fn matches(line: &str) -> bool {
    PATTERNS.iter().any(|re| re.is_match(line))
}

#[cfg(test)]
#[path = "indicators_tests.rs"]
mod tests;
