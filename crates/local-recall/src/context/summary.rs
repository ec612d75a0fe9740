//! Per-request context summary

use serde::Serialize;
use std::collections::BTreeMap;

/// Compressed view of one user's context, built fresh for a single request
/// and discarded after use. Never persisted; the audit trail stores the
/// rolling conversation summary instead.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    /// Dominant topic of the current message, "general" when untagged.
    pub current_topic: String,
    /// First sentences of high-importance durable turns, newest first.
    pub key_facts: Vec<String>,
    /// Stored preferences whose keys appear in the current message.
    pub user_preferences: BTreeMap<String, String>,
    /// Rendered snippets of the user's recent working-set turns.
    pub recent_context: String,
    /// Inferred goal, "general_conversation" when nothing matches.
    pub conversation_goal: String,
}
