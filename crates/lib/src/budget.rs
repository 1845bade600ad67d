//! # Token Budgeting
//!
//! A coarse, deterministic stand-in for a tokenizer: one token is taken to be
//! `chars_per_token` characters. Everything that bounds context size goes
//! through [`TokenBudget`].

use crate::constants::{
    CHARS_PER_TOKEN, HARD_CAP_TOKENS, LINE_BREAK_WINDOW_PERCENT, PER_ATTACHMENT_TOKENS,
    WARN_THRESHOLD_TOKENS,
};
use serde::{Deserialize, Serialize};

/// Token limits applied to attachments and to the assembled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    #[serde(default = "default_per_attachment")]
    pub per_attachment_tokens: usize,
    #[serde(default = "default_hard_cap")]
    pub hard_cap_tokens: usize,
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold_tokens: usize,
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

fn default_per_attachment() -> usize {
    PER_ATTACHMENT_TOKENS
}
fn default_hard_cap() -> usize {
    HARD_CAP_TOKENS
}
fn default_warn_threshold() -> usize {
    WARN_THRESHOLD_TOKENS
}
fn default_chars_per_token() -> usize {
    CHARS_PER_TOKEN
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            per_attachment_tokens: PER_ATTACHMENT_TOKENS,
            hard_cap_tokens: HARD_CAP_TOKENS,
            warn_threshold_tokens: WARN_THRESHOLD_TOKENS,
            chars_per_token: CHARS_PER_TOKEN,
        }
    }
}

impl TokenBudget {
    /// Estimates the token count of `text` as `floor(chars / chars_per_token)`.
    pub fn estimate(&self, text: &str) -> usize {
        text.chars().count() / self.chars_per_token.max(1)
    }

    /// Bounds `text` to `tokens` worth of characters.
    ///
    /// Returns the (possibly shortened) text and whether it was cut. When the
    /// last line break inside the slice falls in the final tenth of the
    /// character budget, the cut is moved back to that line break so the
    /// output does not end mid-line.
    pub fn truncate(&self, text: &str, tokens: usize) -> (String, bool) {
        let char_budget = tokens.saturating_mul(self.chars_per_token.max(1));

        let cut = match text.char_indices().nth(char_budget) {
            Some((byte_idx, _)) => byte_idx,
            None => return (text.to_string(), false),
        };
        let slice = &text[..cut];

        if let Some(newline_byte) = slice.rfind('\n') {
            let newline_char = slice[..newline_byte].chars().count();
            if newline_char * 100 >= char_budget * LINE_BREAK_WINDOW_PERCENT {
                return (slice[..newline_byte].to_string(), true);
            }
        }

        (slice.to_string(), true)
    }

    /// Truncates to the per-attachment budget.
    pub fn truncate_attachment(&self, text: &str) -> (String, bool) {
        self.truncate(text, self.per_attachment_tokens)
    }

    /// Where an aggregate estimate falls relative to the warn and hard limits.
    pub fn classify(&self, tokens: usize) -> BudgetLevel {
        if tokens > self.hard_cap_tokens {
            BudgetLevel::OverHardCap
        } else if tokens > self.warn_threshold_tokens {
            BudgetLevel::Warn
        } else {
            BudgetLevel::Ok
        }
    }
}

/// Outcome of the aggregate size gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLevel {
    Ok,
    Warn,
    OverHardCap,
}
