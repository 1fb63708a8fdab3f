// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress tracker & circuit breaker: parses `---STATUS---` blocks out of
//! a session's filtered text and drives the breaker/exit-gate per block.

mod breaker;
mod indicators;
mod parser;

pub use breaker::{BreakerState, CircuitBreaker, CircuitBreakerStatus};
pub use parser::{LineOutcome, ProgressParser, StatusBlock, TestsStatus, WorkStatus};

use crate::events::SessionEvent;
use crate::session::{now_epoch_ms, Session};

/// Feed one filtered chunk (possibly multiple lines) through the session's
/// progress parser and circuit breaker, emitting the resulting events.
/// Only called for modes whose [`crate::session::ModeProfile::parses_progress`]
/// returns true.
pub(crate) async fn feed_line(session: &Session, filtered_text: &str) {
    let now = now_epoch_ms();
    for line in filtered_text.lines() {
        let outcome = {
            let mut parser = session.progress().lock().await;
            parser.feed_line(line, now)
        };

        match outcome {
            LineOutcome::Block(Ok(block)) => {
                // Edge-triggered: `exit_gate_met` latches true once tripped,
                // so only fire the event the first time we observe it.
                let exit_gate_newly_met = {
                    let mut parser = session.progress().lock().await;
                    if parser.exit_gate_met && !parser.exit_gate_notified {
                        parser.exit_gate_notified = true;
                        true
                    } else {
                        false
                    }
                };

                let breaker_status = {
                    let mut breaker = session.breaker().lock().await;
                    breaker.observe(&block, now)
                };

                session.emit_event(SessionEvent::StatusBlock { block });
                session.emit_event(SessionEvent::CircuitBreakerUpdate { status: breaker_status });
                if exit_gate_newly_met {
                    session.emit_event(SessionEvent::ExitGateMet);
                }
            }
            LineOutcome::Block(Err(err)) => {
                tracing::warn!(error = %err, "dropping invalid status block");
            }
            LineOutcome::CompletionIndicator | LineOutcome::None => {}
        }
    }
}

/// External progress hint (`SPEC_FULL.md` §4.5): the respawn controller
/// observed forward motion outside of a status block — reset the breaker's
/// no-progress counters the same way an in-band `hasProgress` block would.
pub(crate) async fn notify_iteration_progress(session: &Session, cycle_number: u64) {
    session.breaker().lock().await.notify_iteration_progress(cycle_number);
}
