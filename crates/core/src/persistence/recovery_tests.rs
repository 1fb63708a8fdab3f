// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::SessionId;

fn pane(name: &str) -> PaneRecord {
    PaneRecord { mux_name: name.to_string(), pid: Some(1), foreground_command: Some("claude".to_string()) }
}

fn persisted(id: SessionId, name: &str) -> PersistedPane {
    PersistedPane { session_id: id, mux_name: name.to_string() }
}

#[test]
fn classifies_alive_dead_and_discovered() {
    let known_alive = SessionId::new();
    let known_dead = SessionId::new();

    let persisted_panes = vec![persisted(known_alive, "a"), persisted(known_dead, "b")];
    let live_panes = vec![pane("a"), pane("c")];

    let result = reconcile(&persisted_panes, &live_panes);

    assert_eq!(result.alive.len(), 1);
    assert_eq!(result.alive[0].session_id, known_alive);
    assert_eq!(result.dead.len(), 1);
    assert_eq!(result.dead[0].session_id, known_dead);
    assert_eq!(result.discovered.len(), 1);
    assert_eq!(result.discovered[0].mux_name, "c");
}

#[test]
fn guesses_mode_from_foreground_command() {
    let mut pane = pane("x");
    pane.foreground_command = Some("opencode".to_string());
    assert_eq!(guess_mode(&pane), crate::session::Mode::OpenCode);

    pane.foreground_command = Some("bash".to_string());
    assert_eq!(guess_mode(&pane), crate::session::Mode::Shell);
}
