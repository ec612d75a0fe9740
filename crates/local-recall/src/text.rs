//! Text processing utilities for context assembly

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Budget-oriented text operations without allocation when possible
pub struct TextUtils;

impl TextUtils {
    /// Hard-truncate to at most `max_chars` characters, always on a char
    /// boundary. No ellipsis; budget limits are exact, not cosmetic.
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    /// Everything before the first '.' (the whole text when there is none).
    pub fn first_sentence(text: &str) -> &str {
        match text.find('.') {
            Some(idx) => &text[..idx],
            None => text,
        }
    }

    /// Collapse runs of whitespace to single spaces and trim the ends.
    pub fn normalize_whitespace(text: &str) -> Cow<'_, str> {
        if WHITESPACE_REGEX.is_match(text) {
            Cow::Owned(WHITESPACE_REGEX.replace_all(text, " ").trim().to_string())
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Count characters, not bytes. Budgets are measured in characters so
    /// multi-byte input cannot blow a limit early.
    pub fn count_chars(text: &str) -> usize {
        text.chars().count()
    }

    /// Lowercased whitespace-delimited tokens, for overlap matching.
    pub fn word_set(text: &str) -> std::collections::HashSet<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// True when the two texts share at least one whitespace token,
    /// case-insensitively.
    pub fn shares_word(text: &str, words: &std::collections::HashSet<String>) -> bool {
        text.to_lowercase()
            .split_whitespace()
            .any(|word| words.contains(word))
    }
}
