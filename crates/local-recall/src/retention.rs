//! Retention tiers and the expiry policy applied to stored turns

use serde::{Deserialize, Serialize};

/// Importance above this value promotes a turn to long-term memory.
pub const LONG_TERM_THRESHOLD: f64 = 8.0;
/// Importance above this value promotes a turn to working memory.
pub const WORKING_THRESHOLD: f64 = 6.0;

/// Retention tier assigned when a turn is recorded. A turn is never
/// reclassified after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryClass {
    /// Deleted once older than the configured retention window.
    Ephemeral,
    /// Kept while recent or important; stale low-value turns are swept.
    Working,
    /// Never expired.
    LongTerm,
}

impl MemoryClass {
    /// Classify an importance score. Thresholds are strict: exactly 6.0
    /// stays ephemeral and exactly 8.0 stays working.
    pub fn classify(score: f64) -> Self {
        if score > LONG_TERM_THRESHOLD {
            MemoryClass::LongTerm
        } else if score > WORKING_THRESHOLD {
            MemoryClass::Working
        } else {
            MemoryClass::Ephemeral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryClass::Ephemeral => "ephemeral",
            MemoryClass::Working => "working",
            MemoryClass::LongTerm => "long_term",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ephemeral" => Some(MemoryClass::Ephemeral),
            "working" => Some(MemoryClass::Working),
            "long_term" => Some(MemoryClass::LongTerm),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Windows and floors applied by the expiry sweep.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Age in days after which ephemeral turns are deleted.
    pub days_to_keep: i64,
    /// Age in days after which low-value working turns become candidates.
    pub working_days: i64,
    /// Working turns at or above this score survive the age check.
    pub working_score_floor: f64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            days_to_keep: 30,
            working_days: 7,
            working_score_floor: 6.0,
        }
    }
}
