// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker: halts the respawn controller once an agent stops
//! making progress, per the transition table in `SPEC_FULL.md` §4.5.

use serde::Serialize;

use super::parser::{StatusBlock, TestsStatus, WorkStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    HalfOpen,
    Open,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStatus {
    pub state: BreakerState,
    pub consecutive_no_progress: u32,
    pub consecutive_same_error: u32,
    pub consecutive_tests_failure: u32,
    pub last_progress_iteration: u64,
    pub reason: Option<String>,
    pub reason_code: Option<&'static str>,
    pub last_transition_at: i64,
}

impl Default for CircuitBreakerStatus {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_no_progress: 0,
            consecutive_same_error: 0,
            consecutive_tests_failure: 0,
            last_progress_iteration: 0,
            reason: None,
            reason_code: None,
            last_transition_at: 0,
        }
    }
}

#[derive(Default)]
pub struct CircuitBreaker {
    status: CircuitBreakerStatus,
    iteration: u64,
}

impl CircuitBreaker {
    pub fn status(&self) -> CircuitBreakerStatus {
        self.status.clone()
    }

    pub fn reset(&mut self) {
        self.status = CircuitBreakerStatus::default();
    }

    /// Feed one parsed status block, returning the (possibly unchanged)
    /// status afterward.
    pub fn observe(&mut self, block: &StatusBlock, now_ms: i64) -> CircuitBreakerStatus {
        self.iteration += 1;

        if block.status == WorkStatus::Blocked {
            self.transition(BreakerState::Open, Some("same_error_repeated"), now_ms);
            return self.status.clone();
        }

        if block.has_progress() {
            self.status.consecutive_no_progress = 0;
            self.status.consecutive_same_error = 0;
            self.status.last_progress_iteration = self.iteration;
            if self.status.state == BreakerState::HalfOpen {
                self.transition(BreakerState::Closed, None, now_ms);
            }
        } else {
            self.status.consecutive_no_progress += 1;
            match self.status.state {
                BreakerState::Closed if self.status.consecutive_no_progress >= 3 => {
                    self.transition(BreakerState::Open, Some("no_progress_open"), now_ms);
                }
                BreakerState::Closed if self.status.consecutive_no_progress >= 2 => {
                    self.transition(BreakerState::HalfOpen, Some("no_progress"), now_ms);
                }
                BreakerState::HalfOpen if self.status.consecutive_no_progress >= 3 => {
                    self.transition(BreakerState::Open, Some("no_progress_open"), now_ms);
                }
                _ => {}
            }
        }

        if block.tests_status == TestsStatus::Failing {
            self.status.consecutive_tests_failure += 1;
            if self.status.consecutive_tests_failure >= 5 {
                self.transition(BreakerState::Open, Some("tests_failing_too_long"), now_ms);
            }
        } else {
            self.status.consecutive_tests_failure = 0;
        }

        self.status.clone()
    }

    /// External progress hint (`SPEC_FULL.md` §4.5): the controller observed
    /// forward motion outside of a status block (e.g. it sent an update and
    /// the agent engaged), so reset the no-progress counters as if a status
    /// block with `hasProgress = true` had just been parsed. An `OPEN`
    /// breaker stays `OPEN` — only an observed status block or an explicit
    /// reset clears it, matching the monotonic-history invariant.
    pub fn notify_iteration_progress(&mut self, cycle_number: u64) {
        self.status.consecutive_no_progress = 0;
        self.status.consecutive_same_error = 0;
        self.status.last_progress_iteration = cycle_number;
        if self.status.state == BreakerState::HalfOpen {
            self.status.state = BreakerState::Closed;
            self.status.reason = None;
            self.status.reason_code = None;
        }
    }

    fn transition(&mut self, state: BreakerState, reason_code: Option<&'static str>, now_ms: i64) {
        if self.status.state == state && self.status.reason_code == reason_code {
            return;
        }
        self.status.state = state;
        self.status.reason_code = reason_code;
        self.status.reason = reason_code.map(|c| c.replace('_', " "));
        self.status.last_transition_at = now_ms;
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
