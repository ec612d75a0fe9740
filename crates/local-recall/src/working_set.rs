//! Bounded in-process cache of the most recent turns
//!
//! The buffer is global across users and strictly FIFO: the eleventh append
//! always evicts the first, no matter whose turn it was or how important.
//! The turn store stays authoritative; losing this cache loses nothing.

use crate::store::schema::ConversationTurn;
use std::collections::VecDeque;
use std::sync::RwLock;

pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity FIFO over recent turns, safe to share across tasks.
/// Reads return point-in-time clones and never block appends for long.
pub struct WorkingSet {
    buffer: RwLock<VecDeque<ConversationTurn>>,
    capacity: usize,
}

impl WorkingSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append one turn, evicting the oldest entry when full.
    pub fn append(&self, turn: ConversationTurn) {
        let mut buffer = self.buffer.write().unwrap();
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(turn);
    }

    /// This user's turns currently in the buffer, oldest first.
    pub fn recent_for(&self, user_id: &str) -> Vec<ConversationTurn> {
        let buffer = self.buffer.read().unwrap();
        buffer
            .iter()
            .filter(|turn| turn.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Point-in-time copy of the whole buffer, oldest first.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.buffer.read().unwrap().iter().cloned().collect()
    }

    /// Replace the buffer contents with `turns` in arrival order, keeping
    /// only the newest `capacity` entries. Used at process start to warm
    /// the cache from the store.
    pub fn rebuild(&self, turns: Vec<ConversationTurn>) {
        let mut buffer = self.buffer.write().unwrap();
        buffer.clear();
        let skip = turns.len().saturating_sub(self.capacity);
        buffer.extend(turns.into_iter().skip(skip));
    }

    pub fn len(&self) -> usize {
        self.buffer.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.read().unwrap().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::MemoryClass;
    use chrono::Utc;

    fn make_turn(user_id: &str, message: &str) -> ConversationTurn {
        ConversationTurn {
            user_id: user_id.to_string(),
            message: message.to_string(),
            response: String::new(),
            timestamp: Utc::now(),
            content_hash: String::new(),
            context_summary: String::new(),
            importance_score: 5.0,
            topic_tags: vec![],
            memory_class: MemoryClass::Ephemeral,
        }
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let set = WorkingSet::new(10);
        for i in 1..=11 {
            set.append(make_turn("alice", &format!("turn {}", i)));
        }

        assert_eq!(set.len(), 10);
        let snapshot = set.snapshot();
        assert_eq!(snapshot[0].message, "turn 2");
        assert_eq!(snapshot[9].message, "turn 11");
    }

    #[test]
    fn test_eviction_ignores_importance() {
        let set = WorkingSet::new(2);
        let mut critical = make_turn("alice", "critical");
        critical.importance_score = 10.0;
        set.append(critical);
        set.append(make_turn("alice", "small talk"));
        set.append(make_turn("alice", "more small talk"));

        let messages: Vec<_> = set.snapshot().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["small talk", "more small talk"]);
    }

    #[test]
    fn test_recent_for_filters_by_user_in_order() {
        let set = WorkingSet::new(10);
        set.append(make_turn("alice", "a1"));
        set.append(make_turn("bob", "b1"));
        set.append(make_turn("alice", "a2"));

        let alice: Vec<_> = set
            .recent_for("alice")
            .into_iter()
            .map(|t| t.message)
            .collect();
        assert_eq!(alice, vec!["a1", "a2"]);
        assert_eq!(set.recent_for("carol").len(), 0);
    }

    #[test]
    fn test_shared_buffer_crowds_out_other_users() {
        let set = WorkingSet::new(3);
        set.append(make_turn("alice", "a1"));
        set.append(make_turn("bob", "b1"));
        set.append(make_turn("bob", "b2"));
        set.append(make_turn("bob", "b3"));

        assert!(set.recent_for("alice").is_empty());
        assert_eq!(set.recent_for("bob").len(), 3);
    }

    #[test]
    fn test_rebuild_keeps_newest_capacity() {
        let set = WorkingSet::new(3);
        set.append(make_turn("alice", "stale"));

        let turns: Vec<_> = (1..=5)
            .map(|i| make_turn("alice", &format!("turn {}", i)))
            .collect();
        set.rebuild(turns);

        let messages: Vec<_> = set.snapshot().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["turn 3", "turn 4", "turn 5"]);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let set = WorkingSet::new(0);
        set.append(make_turn("alice", "only"));
        set.append(make_turn("alice", "newer"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.snapshot()[0].message, "newer");
    }
}
