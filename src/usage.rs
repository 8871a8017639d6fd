//! Token-usage accounting for one extraction request.
//!
//! A [`TokenTracker`] is created fresh at the start of each request and
//! threaded explicitly through every model call — it is deliberately *not*
//! shared state, so concurrent requests stay isolated without locking.

use serde::{Deserialize, Serialize};

/// Snapshot of token consumption, as reported in the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Running tally of token consumption across the model calls of one request.
///
/// Lifecycle: created at request start, updated after every model call
/// (including the deduplication call), read once to produce the response
/// field, then dropped.
#[derive(Debug, Default)]
pub struct TokenTracker {
    input_tokens: u64,
    output_tokens: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one model call's token counts.
    pub fn add(&mut self, input_tokens: u32, output_tokens: u32) {
        self.input_tokens += u64::from(input_tokens);
        self.output_tokens += u64::from(output_tokens);
    }

    /// Snapshot the tally for the response.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            total_tokens: self.input_tokens + self.output_tokens,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}
