// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn no_progress_block() -> StatusBlock {
    StatusBlock {
        status: WorkStatus::InProgress,
        tasks_completed_this_loop: 0,
        files_modified: 0,
        tests_status: TestsStatus::NotRun,
        work_type: None,
        exit_signal: false,
        recommendation: None,
        parsed_at: 0,
    }
}

#[test]
fn three_no_progress_blocks_open_the_breaker() {
    let mut breaker = CircuitBreaker::default();
    let s1 = breaker.observe(&no_progress_block(), 0);
    assert_eq!(s1.state, BreakerState::Closed);
    let s2 = breaker.observe(&no_progress_block(), 0);
    assert_eq!(s2.state, BreakerState::HalfOpen);
    let s3 = breaker.observe(&no_progress_block(), 0);
    assert_eq!(s3.state, BreakerState::Open);
}

#[test]
fn progress_resets_and_closes_from_half_open() {
    let mut breaker = CircuitBreaker::default();
    breaker.observe(&no_progress_block(), 0);
    breaker.observe(&no_progress_block(), 0);
    assert_eq!(breaker.status().state, BreakerState::HalfOpen);

    let mut block = no_progress_block();
    block.files_modified = 2;
    let status = breaker.observe(&block, 0);
    assert_eq!(status.state, BreakerState::Closed);
    assert_eq!(status.consecutive_no_progress, 0);
}

#[test]
fn blocked_status_opens_unconditionally() {
    let mut breaker = CircuitBreaker::default();
    let mut block = no_progress_block();
    block.status = WorkStatus::Blocked;
    let status = breaker.observe(&block, 0);
    assert_eq!(status.state, BreakerState::Open);
    assert_eq!(status.reason_code, Some("same_error_repeated"));
}

#[test]
fn three_no_progress_blocks_report_the_spec_stop_reason() {
    let mut breaker = CircuitBreaker::default();
    breaker.observe(&no_progress_block(), 0);
    breaker.observe(&no_progress_block(), 0);
    let status = breaker.observe(&no_progress_block(), 0);
    assert_eq!(status.state, BreakerState::Open);
    assert_eq!(status.reason_code, Some("no_progress_open"));
}

#[test]
fn external_progress_hint_resets_counters_without_closing_an_open_breaker() {
    let mut breaker = CircuitBreaker::default();
    breaker.observe(&no_progress_block(), 0);
    breaker.observe(&no_progress_block(), 0);
    assert_eq!(breaker.status().state, BreakerState::HalfOpen);

    breaker.notify_iteration_progress(7);
    let status = breaker.status();
    assert_eq!(status.consecutive_no_progress, 0);
    assert_eq!(status.consecutive_same_error, 0);
    assert_eq!(status.last_progress_iteration, 7);
    assert_eq!(status.state, BreakerState::Closed, "half-open closes once progress is observed");
}

#[test]
fn five_consecutive_test_failures_open_the_breaker() {
    let mut breaker = CircuitBreaker::default();
    let mut block = no_progress_block();
    block.files_modified = 1; // keep no-progress counter from tripping first
    block.tests_status = TestsStatus::Failing;
    for _ in 0..4 {
        let status = breaker.observe(&block, 0);
        assert_eq!(status.state, BreakerState::Closed);
    }
    let status = breaker.observe(&block, 0);
    assert_eq!(status.state, BreakerState::Open);
    assert_eq!(status.reason_code, Some("tests_failing_too_long"));
}
