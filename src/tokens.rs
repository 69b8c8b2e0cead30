//! Token counting and cost estimation for test runs.

use std::sync::{Mutex, OnceLock};

use serde::Serialize;
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::client::ChatMessage;

/// Average chars per token when the BPE tokenizer is unavailable.
const FALLBACK_CHARS_PER_TOKEN: f32 = 4.0;

fn shared_bpe() -> Option<&'static Mutex<CoreBPE>> {
    static BPE: OnceLock<Option<Mutex<CoreBPE>>> = OnceLock::new();
    BPE.get_or_init(|| cl100k_base().ok().map(Mutex::new)).as_ref()
}

/// Counts tokens with the shared cl100k BPE, falling back to a character
/// heuristic if the tokenizer cannot be initialized.
pub fn count_tokens(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    if let Some(bpe) = shared_bpe() {
        if let Ok(bpe) = bpe.lock() {
            return bpe.encode_ordinary(text).len();
        }
    }
    heuristic_count(text)
}

fn heuristic_count(text: &str) -> usize {
    ((text.chars().count() as f32) / FALLBACK_CHARS_PER_TOKEN)
        .ceil()
        .max(1.0) as usize
}

/// Price per 1k tokens, in the account currency.
#[derive(Debug, Clone, Serialize)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_1k: 0.002,
            output_per_1k: 0.006,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
    pub cost: f64,
}

/// Token and cost estimate for one test run: the configured messages are
/// the input side, the streamed response the output side.
pub fn estimate_cost(messages: &[ChatMessage], response: &str, pricing: &Pricing) -> CostEstimate {
    let input_tokens: usize = messages
        .iter()
        .map(|message| count_tokens(&message.content))
        .sum();
    let output_tokens = count_tokens(response);
    let cost = (input_tokens as f64 / 1000.0) * pricing.input_per_1k
        + (output_tokens as f64 / 1000.0) * pricing.output_per_1k;

    CostEstimate {
        input_tokens,
        output_tokens,
        total_tokens: input_tokens + output_tokens,
        cost,
    }
}
