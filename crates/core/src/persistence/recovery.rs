// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup reconciliation: compares persisted pane records against live
//! multiplexer panes (`SPEC_FULL.md` §4.6 step 3).

use crate::mux::PaneRecord;

use super::PersistedPane;

#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Persisted session known to still have a live pane.
    pub alive: Vec<PersistedPane>,
    /// Persisted session whose pane is gone.
    pub dead: Vec<PersistedPane>,
    /// Live pane the multiplexer knows about that has no persisted record.
    pub discovered: Vec<PaneRecord>,
}

pub fn reconcile(persisted: &[PersistedPane], live: &[PaneRecord]) -> Reconciliation {
    let mut result = Reconciliation::default();
    let mut matched_live = vec![false; live.len()];

    for record in persisted {
        if let Some((idx, _)) = live.iter().enumerate().find(|(_, l)| record.matches(l)) {
            matched_live[idx] = true;
            result.alive.push(record.clone());
        } else {
            result.dead.push(record.clone());
        }
    }

    for (idx, pane) in live.iter().enumerate() {
        if !matched_live[idx] {
            result.discovered.push(pane.clone());
        }
    }

    result
}

/// Guess a mode from a discovered pane's foreground command, the fallback
/// used only when no persisted record disagrees (persisted mode always
/// wins when present).
pub fn guess_mode(pane: &PaneRecord) -> crate::session::Mode {
    match pane.foreground_command.as_deref() {
        Some(cmd) if cmd.contains("claude") => crate::session::Mode::Claude,
        Some(cmd) if cmd.contains("opencode") => crate::session::Mode::OpenCode,
        _ => crate::session::Mode::Shell,
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
