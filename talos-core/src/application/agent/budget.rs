use crate::domain::types::TokenUsage;

/// Divisor for the serialized-length fallback when no API reading exists yet.
const BYTES_PER_TOKEN: u64 = 4;

/// Tracks how full the model's context window is.
///
/// The reading comes from the API's reported `prompt_tokens` whenever a
/// response has been seen; the bytes/4 heuristic only covers the gaps before
/// the first response and right after the history was rewritten by
/// compression.
#[derive(Debug, Clone)]
pub struct TokenBudget {
    max_context_tokens: u64,
    compression_threshold: u64,
    current_context_tokens: u64,
    cumulative_used: u64,
    estimated: bool,
}

impl TokenBudget {
    pub fn new(max_context_tokens: u64, compression_threshold: u64) -> Self {
        Self {
            max_context_tokens,
            compression_threshold,
            current_context_tokens: 0,
            cumulative_used: 0,
            estimated: true,
        }
    }

    /// Adopt the authoritative reading from a model response.
    pub fn record_usage(&mut self, usage: &TokenUsage) {
        let total = if usage.total_tokens > 0 {
            usage.total_tokens
        } else {
            usage.prompt_tokens + usage.completion_tokens
        };
        self.cumulative_used = self.cumulative_used.saturating_add(total);
        self.current_context_tokens = usage.prompt_tokens;
        self.estimated = false;
    }

    /// Bill tokens spent outside the main loop, such as summarization
    /// sub-calls. Leaves the context reading alone.
    pub fn record_sub_usage(&mut self, tokens: u64) {
        self.cumulative_used = self.cumulative_used.saturating_add(tokens);
    }

    /// Re-derive the reading from the serialized transcript length, used when
    /// no response has been seen for the current history shape.
    pub fn re_estimate(&mut self, serialized_len: usize) {
        self.current_context_tokens = (serialized_len as u64).div_ceil(BYTES_PER_TOKEN);
        self.estimated = true;
    }

    pub fn should_compress(&self) -> bool {
        self.current_context_tokens >= self.compression_threshold
    }

    pub fn over_ceiling(&self) -> bool {
        self.current_context_tokens >= self.max_context_tokens
    }

    pub fn current_context_tokens(&self) -> u64 {
        self.current_context_tokens
    }

    pub fn cumulative_used(&self) -> u64 {
        self.cumulative_used
    }

    pub fn max_context_tokens(&self) -> u64 {
        self.max_context_tokens
    }

    pub fn compression_threshold(&self) -> u64 {
        self.compression_threshold
    }

    pub fn is_estimated(&self) -> bool {
        self.estimated
    }
}
