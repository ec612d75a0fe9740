//! Deterministic conversation summarization
//!
//! No model in the loop: summaries are assembled from tags and scores the
//! turns already carry, so the same input always yields the same text.

use crate::scoring::taxonomy::{dominant_tag, GENERAL_TOPIC};
use crate::store::schema::ConversationTurn;
use crate::text::TextUtils;

pub const SUMMARY_MAX_CHARS: usize = 500;
pub const KEY_POINT_MAX_CHARS: usize = 100;
pub const KEY_POINT_MIN_CHARS: usize = 20;
pub const MAX_KEY_POINTS: usize = 3;
pub const TOPIC_WINDOW_TURNS: usize = 3;
pub const KEY_POINT_SCORE_FLOOR: f64 = 7.0;
pub const EMPTY_SUMMARY: &str = "New conversation";

/// Compresses a window of turns into a single summary line.
#[derive(Debug, Clone)]
pub struct Summarizer {
    max_chars: usize,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self {
            max_chars: SUMMARY_MAX_CHARS,
        }
    }
}

impl Summarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Dominant topic over the last few turns' tags, or "general" when the
    /// window carries no tags at all.
    pub fn topic(&self, turns: &[ConversationTurn]) -> String {
        let window_start = turns.len().saturating_sub(TOPIC_WINDOW_TURNS);
        let mut recent_tags: Vec<String> = Vec::new();
        for turn in &turns[window_start..] {
            recent_tags.extend(turn.topic_tags.iter().cloned());
        }
        dominant_tag(&recent_tags).unwrap_or(GENERAL_TOPIC).to_string()
    }

    /// Summarize turns in order: a topic line plus up to three key points
    /// taken from high-importance responses, capped at `max_chars`. The
    /// cap is a hard cut, mid-word if need be.
    pub fn summarize(&self, turns: &[ConversationTurn]) -> String {
        if turns.is_empty() {
            return EMPTY_SUMMARY.to_string();
        }

        let topic = self.topic(turns);

        let mut key_points: Vec<String> = Vec::new();
        for turn in turns {
            if turn.importance_score <= KEY_POINT_SCORE_FLOOR {
                continue;
            }
            let sentence = TextUtils::first_sentence(&turn.response);
            let point = TextUtils::truncate_chars(sentence, KEY_POINT_MAX_CHARS);
            if TextUtils::count_chars(point) > KEY_POINT_MIN_CHARS {
                key_points.push(point.to_string());
                if key_points.len() == MAX_KEY_POINTS {
                    break;
                }
            }
        }

        let mut summary = format!("Topic: {}", topic);
        if !key_points.is_empty() {
            summary.push_str(" | Key points: ");
            summary.push_str(&key_points.join("; "));
        }

        TextUtils::truncate_chars(&summary, self.max_chars).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::MemoryClass;
    use chrono::Utc;

    fn make_turn(tags: &[&str], score: f64, response: &str) -> ConversationTurn {
        ConversationTurn {
            user_id: "alice".to_string(),
            message: "question".to_string(),
            response: response.to_string(),
            timestamp: Utc::now(),
            content_hash: String::new(),
            context_summary: String::new(),
            importance_score: score,
            topic_tags: tags.iter().map(|t| t.to_string()).collect(),
            memory_class: MemoryClass::Working,
        }
    }

    #[test]
    fn test_empty_input_is_new_conversation() {
        let summarizer = Summarizer::default();
        assert_eq!(summarizer.summarize(&[]), EMPTY_SUMMARY);
    }

    #[test]
    fn test_topic_from_last_three_turns_only() {
        let summarizer = Summarizer::default();
        let turns = vec![
            make_turn(&["web"], 5.0, "older"),
            make_turn(&["web"], 5.0, "older still"),
            make_turn(&["database"], 5.0, "recent"),
            make_turn(&["database"], 5.0, "recent"),
            make_turn(&["programming"], 5.0, "recent"),
        ];
        // window holds database x2 + programming x1
        assert_eq!(summarizer.summarize(&turns), "Topic: database");
    }

    #[test]
    fn test_topic_tie_resolves_to_first_seen() {
        let summarizer = Summarizer::default();
        let turns = vec![
            make_turn(&["web", "database"], 5.0, "one"),
            make_turn(&["database", "web"], 5.0, "two"),
        ];
        assert_eq!(summarizer.summarize(&turns), "Topic: web");
    }

    #[test]
    fn test_untagged_turns_fall_back_to_general() {
        let summarizer = Summarizer::default();
        let turns = vec![make_turn(&[], 5.0, "plain chatter")];
        assert_eq!(summarizer.summarize(&turns), "Topic: general");
    }

    #[test]
    fn test_key_points_from_high_importance_turns() {
        let summarizer = Summarizer::default();
        let turns = vec![
            make_turn(&["database"], 7.5, "The index rebuild finished ahead of schedule. Extra detail."),
            make_turn(&["database"], 5.0, "An unimportant aside that is quite long anyway."),
        ];
        assert_eq!(
            summarizer.summarize(&turns),
            "Topic: database | Key points: The index rebuild finished ahead of schedule"
        );
    }

    #[test]
    fn test_key_points_capped_at_three() {
        let summarizer = Summarizer::default();
        let turns: Vec<_> = (1..=5)
            .map(|i| {
                make_turn(
                    &["web"],
                    8.0,
                    &format!("Deployment number {} completed without any errors. Done.", i),
                )
            })
            .collect();
        let summary = summarizer.summarize(&turns);
        assert_eq!(summary.matches(';').count(), 2);
        assert!(summary.contains("Deployment number 1"));
        assert!(summary.contains("Deployment number 3"));
        assert!(!summary.contains("Deployment number 4"));
    }

    #[test]
    fn test_short_first_sentences_are_dropped() {
        let summarizer = Summarizer::default();
        // first sentence "Yes" is too short to be a key point
        let turns = vec![make_turn(&["web"], 9.0, "Yes. The full rollout happens tomorrow.")];
        assert_eq!(summarizer.summarize(&turns), "Topic: web");
    }

    #[test]
    fn test_exactly_twenty_chars_is_dropped() {
        let summarizer = Summarizer::default();
        // first sentence is exactly 20 characters
        let turns = vec![make_turn(&["web"], 9.0, "abcdefghij abcdefghi. trailing")];
        assert_eq!(summarizer.summarize(&turns), "Topic: web");
    }

    #[test]
    fn test_key_point_truncated_to_hundred_chars() {
        let summarizer = Summarizer::default();
        let long_sentence = "x".repeat(150);
        let turns = vec![make_turn(&["web"], 9.0, &long_sentence)];
        let summary = summarizer.summarize(&turns);
        let point = summary.split("Key points: ").nth(1).unwrap();
        assert_eq!(point.chars().count(), 100);
    }

    #[test]
    fn test_summary_hard_cap_cuts_mid_point() {
        // three 100-char points never reach the default 500 cap, so use a
        // tight cap to show the cut lands mid-text rather than dropping parts
        let summarizer = Summarizer::new(40);
        let turns = vec![make_turn(
            &["web"],
            9.0,
            "The full rollout happens tomorrow at noon exactly",
        )];
        let summary = summarizer.summarize(&turns);
        assert_eq!(summary.chars().count(), 40);
        assert_eq!(summary, "Topic: web | Key points: The full rollou");
    }

    #[test]
    fn test_default_summary_stays_within_500_chars() {
        let summarizer = Summarizer::default();
        let turns: Vec<_> = (0..5)
            .map(|i| {
                let response = format!("Point {} {}", i, "verbose ".repeat(30));
                make_turn(&["web"], 9.0, &response)
            })
            .collect();
        let summary = summarizer.summarize(&turns);
        assert!(summary.chars().count() <= SUMMARY_MAX_CHARS);
        assert!(summary.starts_with("Topic: web | Key points: "));
    }
}
