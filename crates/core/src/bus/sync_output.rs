// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VT synchronized-update wrapping (`SPEC_FULL.md` §3.4): batched terminal
//! writes are wrapped in `ESC[?2026h` / `ESC[?2026l` so a client's terminal
//! renderer defers redraw until the whole batch has landed.

const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";
const SYNC_END: &[u8] = b"\x1b[?2026l";

/// Wrap `chunks` (already concatenated in arrival order) in a synchronized
/// update envelope. A single-chunk batch still gets wrapped: the client
/// can't tell a one-write batch from a many-write one, and the envelope is
/// four bytes of savings either way to skip.
pub fn wrap_batch(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + SYNC_BEGIN.len() + SYNC_END.len());
    out.extend_from_slice(SYNC_BEGIN);
    out.extend_from_slice(payload);
    out.extend_from_slice(SYNC_END);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_payload_with_sync_markers() {
        let wrapped = wrap_batch(b"hello");
        assert!(wrapped.starts_with(SYNC_BEGIN));
        assert!(wrapped.ends_with(SYNC_END));
        assert!(wrapped.windows(b"hello".len()).any(|w| w == b"hello"));
    }
}
