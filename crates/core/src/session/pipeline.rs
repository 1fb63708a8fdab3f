// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-chunk output pipeline: buffer, filter, detect, (for modes that
//! parse progress) feed the progress parser and circuit breaker.

use super::content_filter;
use super::mode::{ActivityVerdict, DetectContext};
use super::state::SessionStatus;
use super::{now_epoch_ms, Session};
use crate::events::SessionEvent;

pub(super) async fn process_chunk(session: &Session, chunk: &[u8]) {
    {
        let mut buffers = session.buffers().write().await;
        buffers.push_terminal(chunk);
    }
    session.emit_event(SessionEvent::Terminal { bytes: chunk.to_vec() });

    let filtered = content_filter::strip_ansi(chunk);
    if filtered.trim().is_empty() {
        return;
    }

    let quiet_for_ms = {
        let state = session.state().read().await;
        now_epoch_ms().saturating_sub(state.last_activity_at)
    };
    let was_idle = {
        let state = session.state().read().await;
        state.status == SessionStatus::Idle
    };

    {
        let mut buffers = session.buffers().write().await;
        buffers.push_text(&filtered);
    }

    // Any non-empty filtered content is, by definition, a content change:
    // advance the activity clock unconditionally.
    {
        let mut state = session.state().write().await;
        state.last_activity_at = now_epoch_ms();
    }

    let profile = session.profile();
    let verdict = profile.classify(DetectContext { filtered_text: &filtered, quiet_for_ms, was_idle });
    apply_verdict(session, verdict).await;

    if let Some((in_delta, out_delta)) = profile.parse_tokens(&filtered) {
        let mut state = session.state().write().await;
        state.input_tokens += in_delta;
        state.output_tokens += out_delta;
    }

    if profile.parses_progress() {
        crate::progress::feed_line(session, &filtered).await;
    }
}

async fn apply_verdict(session: &Session, verdict: ActivityVerdict) {
    match verdict {
        ActivityVerdict::Idle => {
            let changed = {
                let mut state = session.state().write().await;
                let changed = state.status != SessionStatus::Idle;
                state.status = SessionStatus::Idle;
                changed
            };
            if changed {
                session.emit_event(SessionEvent::Idle);
            }
        }
        ActivityVerdict::Busy => {
            let changed = {
                let mut state = session.state().write().await;
                let changed = state.status != SessionStatus::Busy;
                state.status = SessionStatus::Busy;
                changed
            };
            if changed {
                session.emit_event(SessionEvent::Working);
            }
        }
        ActivityVerdict::Unchanged => {}
    }
}
