//! Priority-ordered context assembly under a hard character budget

use crate::context::summary::ContextSummary;
use crate::scoring::taxonomy::{GENERAL_GOAL, GENERAL_TOPIC};
use crate::text::TextUtils;
use tracing::debug;

pub const DEFAULT_MAX_CHARS: usize = 2000;
pub const MAX_FACTS: usize = 2;
pub const MAX_PREFERENCES: usize = 2;

/// Limits applied while assembling a context string.
#[derive(Debug, Clone)]
pub struct BudgeterConfig {
    pub max_chars: usize,
    pub max_facts: usize,
    pub max_preferences: usize,
}

impl Default for BudgeterConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_facts: MAX_FACTS,
            max_preferences: MAX_PREFERENCES,
        }
    }
}

/// Turns a context summary into the single string handed to the model.
///
/// Priority runs goal, topic, facts, preferences. An over-budget assembly
/// keeps only the highest-priority part present and hard-truncates it;
/// the joined string is never cut mid-separator.
#[derive(Debug, Clone, Default)]
pub struct ContextBudgeter {
    config: BudgeterConfig,
}

impl ContextBudgeter {
    pub fn new(config: BudgeterConfig) -> Self {
        Self { config }
    }

    /// Budget applied when the caller does not name one.
    pub fn default_max_chars(&self) -> usize {
        self.config.max_chars
    }

    pub fn assemble(
        &self,
        summary: &ContextSummary,
        current_message: &str,
        max_chars: usize,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();

        if summary.conversation_goal != GENERAL_GOAL {
            parts.push(format!("Goal: {}", summary.conversation_goal));
        }
        if summary.current_topic != GENERAL_TOPIC {
            parts.push(format!("Topic: {}", summary.current_topic));
        }

        let facts = self.relevant_facts(&summary.key_facts, current_message);
        if !facts.is_empty() {
            parts.push(format!("Context: {}", facts.join("; ")));
        }

        let preferences: Vec<String> = summary
            .user_preferences
            .iter()
            .take(self.config.max_preferences)
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        if !preferences.is_empty() {
            parts.push(format!("Preferences: {}", preferences.join("; ")));
        }

        let assembled = parts.join(" | ");
        if TextUtils::count_chars(&assembled) > max_chars {
            debug!(
                "Context over budget ({} chars > {}); keeping highest-priority part",
                TextUtils::count_chars(&assembled),
                max_chars
            );
            let essential = parts.into_iter().next().unwrap_or_default();
            return TextUtils::truncate_chars(&essential, max_chars).to_string();
        }
        assembled
    }

    /// Facts sharing at least one whitespace token with the message,
    /// case-insensitively, in stored order.
    fn relevant_facts(&self, facts: &[String], current_message: &str) -> Vec<String> {
        let message_words = TextUtils::word_set(current_message);
        facts
            .iter()
            .filter(|fact| TextUtils::shares_word(fact, &message_words))
            .take(self.config.max_facts)
            .cloned()
            .collect()
    }
}
