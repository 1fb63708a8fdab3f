// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded buffers a [`super::Session`] keeps for its PTY output.

use std::collections::VecDeque;

const TERMINAL_CAP: usize = 2 * 1024 * 1024;
const TERMINAL_TRIM: usize = (TERMINAL_CAP * 3) / 4;
const TEXT_CAP: usize = 1024 * 1024;
const TEXT_TRIM: usize = (TEXT_CAP * 3) / 4;
const MESSAGES_CAP: usize = 1000;
const MESSAGES_TRIM: usize = 800;

#[derive(Default)]
pub struct SessionBuffers {
    pub terminal: Vec<u8>,
    pub text_output: String,
    pub messages: VecDeque<serde_json::Value>,
}

impl SessionBuffers {
    /// Append raw PTY bytes, trimming the tail-preserving way once over cap.
    pub fn push_terminal(&mut self, chunk: &[u8]) {
        self.terminal.extend_from_slice(chunk);
        if self.terminal.len() > TERMINAL_CAP {
            let drop = self.terminal.len() - TERMINAL_TRIM;
            self.terminal.drain(0..drop);
        }
    }

    /// Append filtered text, trimming the same way.
    pub fn push_text(&mut self, text: &str) {
        self.text_output.push_str(text);
        if self.text_output.len() > TEXT_CAP {
            let drop = self.text_output.len() - TEXT_TRIM;
            // Find a char boundary at or after `drop` so we never split a
            // multi-byte UTF-8 sequence.
            let mut cut = drop;
            while cut < self.text_output.len() && !self.text_output.is_char_boundary(cut) {
                cut += 1;
            }
            self.text_output.drain(0..cut);
        }
    }

    pub fn push_message(&mut self, message: serde_json::Value) {
        self.messages.push_back(message);
        if self.messages.len() > MESSAGES_CAP {
            while self.messages.len() > MESSAGES_TRIM {
                self.messages.pop_front();
            }
        }
    }
}

#[cfg(test)]
#[path = "buffers_tests.rs"]
mod tests;
