// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `---STATUS---` / `---END_STATUS---` block parsing.

use serde::Serialize;

use crate::error::ProgressError;

use super::indicators;

const BLOCK_START: &str = "---STATUS---";
const BLOCK_END: &str = "---END_STATUS---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkStatus {
    InProgress,
    Complete,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestsStatus {
    Passing,
    Failing,
    NotRun,
}

impl Default for TestsStatus {
    fn default() -> Self {
        TestsStatus::NotRun
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBlock {
    pub status: WorkStatus,
    pub tasks_completed_this_loop: u32,
    pub files_modified: u32,
    pub tests_status: TestsStatus,
    pub work_type: Option<String>,
    pub exit_signal: bool,
    pub recommendation: Option<String>,
    pub parsed_at: i64,
}

impl StatusBlock {
    pub fn has_progress(&self) -> bool {
        self.files_modified > 0 || self.tasks_completed_this_loop > 0
    }
}

/// Incremental line-oriented parser: accumulates lines between the start
/// and end sentinels, counts natural-language completion indicators
/// outside of blocks, and tracks the exit-gate counter.
#[derive(Default)]
pub struct ProgressParser {
    in_block: bool,
    block_lines: Vec<String>,
    /// Count of completion signals observed: natural-language indicator
    /// lines plus prior `status = COMPLETE` blocks.
    pub completion_indicators: u32,
    pub exit_gate_met: bool,
    pub exit_gate_notified: bool,
}

pub enum LineOutcome {
    None,
    CompletionIndicator,
    Block(Result<StatusBlock, ProgressError>),
}

impl ProgressParser {
    /// Feed one already-trimmed line. May emit a parsed block when the end
    /// sentinel is observed.
    pub fn feed_line(&mut self, line: &str, now_ms: i64) -> LineOutcome {
        let trimmed = line.trim();

        if self.in_block {
            if trimmed == BLOCK_END {
                self.in_block = false;
                let lines = std::mem::take(&mut self.block_lines);
                let result = parse_block(&lines, now_ms);
                if let Ok(block) = &result {
                    if block.status == WorkStatus::Complete {
                        self.completion_indicators += 1;
                    }
                    if block.exit_signal && self.completion_indicators >= 2 {
                        self.exit_gate_met = true;
                    }
                }
                return LineOutcome::Block(result);
            }
            self.block_lines.push(trimmed.to_string());
            return LineOutcome::None;
        }

        if trimmed == BLOCK_START {
            self.in_block = true;
            self.block_lines.clear();
            return LineOutcome::None;
        }

        if indicators::matches(trimmed) {
            self.completion_indicators += 1;
            return LineOutcome::CompletionIndicator;
        }

        LineOutcome::None
    }
}

fn parse_block(lines: &[String], now_ms: i64) -> Result<StatusBlock, ProgressError> {
    let mut status = None;
    let mut tasks_completed_this_loop = 0u32;
    let mut files_modified = 0u32;
    let mut tests_status = TestsStatus::NotRun;
    let mut work_type = None;
    let mut exit_signal = false;
    let mut recommendation = None;

    for line in lines {
        let Some((key, value)) = line.split_once(':') else { continue };
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();
        match key.as_str() {
            "STATUS" => status = parse_work_status(value),
            "TASKS_COMPLETED_THIS_LOOP" => tasks_completed_this_loop = value.parse().unwrap_or(0),
            "FILES_MODIFIED" => files_modified = value.parse().unwrap_or(0),
            "TESTS_STATUS" => tests_status = parse_tests_status(value).unwrap_or_default(),
            "WORK_TYPE" => work_type = Some(value.to_string()),
            "EXIT_SIGNAL" => exit_signal = value.eq_ignore_ascii_case("true"),
            "RECOMMENDATION" => recommendation = Some(value.to_string()),
            // Unknown fields are logged by the caller and dropped.
            _ => tracing::debug!(field = %key, "dropping unknown status block field"),
        }
    }

    let status = status.ok_or(ProgressError::MissingStatus)?;

    Ok(StatusBlock {
        status,
        tasks_completed_this_loop,
        files_modified,
        tests_status,
        work_type,
        exit_signal,
        recommendation,
        parsed_at: now_ms,
    })
}

fn parse_work_status(value: &str) -> Option<WorkStatus> {
    match value.to_ascii_uppercase().as_str() {
        "IN_PROGRESS" => Some(WorkStatus::InProgress),
        "COMPLETE" => Some(WorkStatus::Complete),
        "BLOCKED" => Some(WorkStatus::Blocked),
        _ => None,
    }
}

fn parse_tests_status(value: &str) -> Option<TestsStatus> {
    match value.to_ascii_uppercase().as_str() {
        "PASSING" => Some(TestsStatus::Passing),
        "FAILING" => Some(TestsStatus::Failing),
        "NOT_RUN" => Some(TestsStatus::NotRun),
        _ => None,
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
