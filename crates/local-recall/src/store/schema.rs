//! Database schema definitions for the context store
use crate::retention::MemoryClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One message/response exchange with its derived metadata. Immutable once
/// recorded; scores and classes are never revised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub content_hash: String,
    /// Rolling summary of the conversation as it stood before this turn.
    /// Audit trail only; context assembly never reads it back.
    pub context_summary: String,
    pub importance_score: f64,
    #[serde(default)]
    pub topic_tags: Vec<String>,
    pub memory_class: MemoryClass,
}

/// Archived summary row from the context_summaries table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSummary {
    pub id: i64,
    pub user_id: String,
    pub summary_text: String,
    pub topic_focus: String,
    pub time_period_start: DateTime<Utc>,
    pub time_period_end: DateTime<Utc>,
}

/// Per-user conversation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationStats {
    pub total_turns: i64,
    pub memory_distribution: HashMap<String, i64>,
    pub average_importance: f64,
    /// Live working-set occupancy; filled in by the manager, not the store.
    pub working_set_len: usize,
}

/// Counters reported by a retention sweep.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ExpiryStats {
    pub ephemeral_removed: usize,
    pub stale_working_removed: usize,
}

impl ExpiryStats {
    pub fn total(&self) -> usize {
        self.ephemeral_removed + self.stale_working_removed
    }
}

pub const SCHEMA_SQL: &str = "
-- Conversation turns table
CREATE TABLE IF NOT EXISTS conversation_turns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    message TEXT NOT NULL,
    response TEXT NOT NULL,
    timestamp TIMESTAMP NOT NULL,
    content_hash TEXT NOT NULL,
    context_summary TEXT NOT NULL DEFAULT '',
    importance_score REAL NOT NULL DEFAULT 5.0,
    topic_tags TEXT NOT NULL DEFAULT '[]',
    memory_class TEXT NOT NULL DEFAULT 'ephemeral',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
-- User profiles table
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id TEXT PRIMARY KEY,
    preferences TEXT,
    last_updated TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
-- Context summaries table (append-only audit trail)
CREATE TABLE IF NOT EXISTS context_summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    summary_text TEXT NOT NULL,
    topic_focus TEXT,
    time_period_start TIMESTAMP NOT NULL,
    time_period_end TIMESTAMP NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_turns_user ON conversation_turns (user_id);
CREATE INDEX IF NOT EXISTS idx_turns_user_importance ON conversation_turns (user_id, importance_score);
CREATE INDEX IF NOT EXISTS idx_turns_class_timestamp ON conversation_turns (memory_class, timestamp);
CREATE INDEX IF NOT EXISTS idx_summaries_user ON context_summaries (user_id);
";
