// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn feed_block(parser: &mut ProgressParser, lines: &[&str]) -> LineOutcome {
    let mut last = LineOutcome::None;
    last = match parser.feed_line("---STATUS---", 0) {
        LineOutcome::Block(_) => panic!("unexpected block on start sentinel"),
        other => other,
    };
    for line in lines {
        last = parser.feed_line(line, 0);
    }
    last
}

#[test]
fn parses_minimal_block_with_defaults() {
    let mut parser = ProgressParser::default();
    let outcome = feed_block(&mut parser, &["STATUS: IN_PROGRESS", "---END_STATUS---"]);
    match outcome {
        LineOutcome::Block(Ok(block)) => {
            assert_eq!(block.status, WorkStatus::InProgress);
            assert_eq!(block.files_modified, 0);
            assert_eq!(block.tests_status, TestsStatus::NotRun);
        }
        _ => panic!("expected a parsed block"),
    }
}

#[test]
fn missing_status_is_rejected() {
    let mut parser = ProgressParser::default();
    let outcome = feed_block(&mut parser, &["FILES_MODIFIED: 3", "---END_STATUS---"]);
    match outcome {
        LineOutcome::Block(Err(ProgressError::MissingStatus)) => {}
        _ => panic!("expected MissingStatus"),
    }
}

#[test]
fn unknown_fields_are_dropped_not_fatal() {
    let mut parser = ProgressParser::default();
    let outcome = feed_block(&mut parser, &["STATUS: COMPLETE", "FOO_BAR: whatever", "---END_STATUS---"]);
    assert!(matches!(outcome, LineOutcome::Block(Ok(_))));
}

#[test]
fn exit_gate_requires_two_prior_indicators() {
    let mut parser = ProgressParser::default();
    feed_block(&mut parser, &["STATUS: COMPLETE", "---END_STATUS---"]);
    assert!(!parser.exit_gate_met);
    feed_block(&mut parser, &["STATUS: COMPLETE", "---END_STATUS---"]);
    let outcome = feed_block(&mut parser, &["STATUS: COMPLETE", "EXIT_SIGNAL: true", "---END_STATUS---"]);
    assert!(matches!(outcome, LineOutcome::Block(Ok(_))));
    assert!(parser.exit_gate_met);
}

#[test]
fn natural_language_indicator_outside_block_counts() {
    let mut parser = ProgressParser::default();
    let outcome = parser.feed_line("All tasks complete.", 0);
    assert!(matches!(outcome, LineOutcome::CompletionIndicator));
    assert_eq!(parser.completion_indicators, 1);
}
