//! Importance scoring for conversation turns
//!
//! Scores are additive heuristics over the raw exchange text, clamped to a
//! fixed range. The same inputs always produce the same score; nothing here
//! consults the store or the clock.

use tracing::trace;

pub const BASE_SCORE: f64 = 5.0;
pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

/// Each keyword present in the combined text adds one point, counted once
/// no matter how often it repeats.
const DEFAULT_SALIENCE_KEYWORDS: [&str; 15] = [
    "remember",
    "important",
    "goal",
    "project",
    "deadline",
    "preference",
    "like",
    "dislike",
    "always",
    "never",
    "configure",
    "setup",
    "error",
    "problem",
    "solution",
];

const LONG_RESPONSE_CHARS: usize = 500;
const SHORT_MESSAGE_CHARS: usize = 20;
const SHORT_RESPONSE_CHARS: usize = 50;

/// Assigns an importance score to a message/response exchange.
///
/// The keyword table lives on the scorer so a deployment can swap it
/// without touching the scoring rules themselves.
#[derive(Debug, Clone)]
pub struct ImportanceScorer {
    salience_keywords: Vec<String>,
}

impl Default for ImportanceScorer {
    fn default() -> Self {
        Self::new(
            DEFAULT_SALIENCE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        )
    }
}

impl ImportanceScorer {
    pub fn new(salience_keywords: Vec<String>) -> Self {
        Self {
            salience_keywords: salience_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    /// Score an exchange. Always returns a value in [1.0, 10.0]; empty
    /// inputs are scored like any other text.
    pub fn score(&self, message: &str, response: &str) -> f64 {
        let combined = format!("{} {}", message, response).to_lowercase();
        let mut score = BASE_SCORE;

        for keyword in &self.salience_keywords {
            if combined.contains(keyword.as_str()) {
                score += 1.0;
            }
        }

        if message.contains('?') {
            score += 1.0;
        }
        if response.chars().count() > LONG_RESPONSE_CHARS {
            score += 1.0;
        }
        if message.chars().count() < SHORT_MESSAGE_CHARS
            && response.chars().count() < SHORT_RESPONSE_CHARS
        {
            score -= 1.0;
        }

        let clamped = score.clamp(MIN_SCORE, MAX_SCORE);
        trace!("Scored exchange at {:.1} (raw {:.1})", clamped, score);
        clamped
    }
}
