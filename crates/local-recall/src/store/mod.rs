//! Context store module - SQLite-based persistence for turns, profiles, and summaries
pub mod profile_store;
pub mod schema;
pub mod summary_store;
pub mod turn_store;
pub use profile_store::ProfileStore;
pub use schema::*;
pub use summary_store::SummaryStore;
pub use turn_store::TurnStore;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Pooled SQLite database backing the context manager. Holds one store
/// handle per table; all of them share the same pool.
pub struct ContextDatabase {
    pub turns: TurnStore,
    pub profiles: ProfileStore,
    pub summaries: SummaryStore,
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl ContextDatabase {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        info!("Opening context database at: {}", db_path.display());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(db_path).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        );
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create connection pool: {}", e))?;

        {
            let conn = pool.get()?;
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        let pool = Arc::new(pool);
        info!("Context database initialized");
        Ok(Self::from_pool(pool))
    }

    /// In-memory database for tests. A single pooled connection, so every
    /// handle sees the same database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        {
            let conn = pool.get()?;
            conn.execute_batch(schema::SCHEMA_SQL)?;
        }
        Ok(Self::from_pool(Arc::new(pool)))
    }

    /// Open an existing database without write access. Inserts and deletes
    /// through this handle fail at the SQLite layer.
    pub fn open_read_only(db_path: &Path) -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::file(db_path).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        );
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create connection pool: {}", e))?;
        {
            let conn = pool.get()?;
            conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        }
        Ok(Self::from_pool(Arc::new(pool)))
    }

    fn from_pool(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self {
            turns: TurnStore::new(Arc::clone(&pool)),
            profiles: ProfileStore::new(Arc::clone(&pool)),
            summaries: SummaryStore::new(Arc::clone(&pool)),
            pool,
        }
    }
}

impl Drop for ContextDatabase {
    fn drop(&mut self) {
        if let Ok(conn) = self.pool.get() {
            let _ = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::MemoryClass;
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;

    fn make_turn(user_id: &str, score: f64, class: MemoryClass) -> ConversationTurn {
        ConversationTurn {
            user_id: user_id.to_string(),
            message: "the project deadline moved to next friday".to_string(),
            response: "Understood, the deadline is now tracked for friday. I will plan around it."
                .to_string(),
            timestamp: Utc::now(),
            content_hash: "hash".to_string(),
            context_summary: "New conversation".to_string(),
            importance_score: score,
            topic_tags: vec![],
            memory_class: class,
        }
    }

    // ===== Turn store =====

    #[test]
    fn test_insert_and_fetch_high_importance() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let mut turn = make_turn("alice", 7.5, MemoryClass::Working);
        turn.topic_tags = vec!["programming".to_string()];
        db.turns.insert_turn(&turn).unwrap();

        let fetched = db.turns.high_importance_turns("alice", 7.0, 5).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].message, turn.message);
        assert_eq!(fetched[0].topic_tags, vec!["programming".to_string()]);
        assert_eq!(fetched[0].memory_class, MemoryClass::Working);
        assert!((fetched[0].importance_score - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_high_importance_excludes_ephemeral_and_threshold() {
        let db = ContextDatabase::open_in_memory().unwrap();
        // high score but ephemeral class is not durable history
        db.turns
            .insert_turn(&make_turn("alice", 7.5, MemoryClass::Ephemeral))
            .unwrap();
        // durable class but exactly at the threshold
        db.turns
            .insert_turn(&make_turn("alice", 7.0, MemoryClass::Working))
            .unwrap();

        let fetched = db.turns.high_importance_turns("alice", 7.0, 5).unwrap();
        assert!(fetched.is_empty());
    }

    #[test]
    fn test_high_importance_scoped_to_user() {
        let db = ContextDatabase::open_in_memory().unwrap();
        db.turns
            .insert_turn(&make_turn("alice", 9.0, MemoryClass::LongTerm))
            .unwrap();
        db.turns
            .insert_turn(&make_turn("bob", 9.0, MemoryClass::LongTerm))
            .unwrap();

        let fetched = db.turns.high_importance_turns("alice", 7.0, 5).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].user_id, "alice");
    }

    #[test]
    fn test_high_importance_newest_first_with_limit() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let base = Utc::now();
        for i in 0..7 {
            let mut turn = make_turn("alice", 8.0, MemoryClass::Working);
            turn.timestamp = base + Duration::seconds(i);
            turn.message = format!("turn {}", i);
            db.turns.insert_turn(&turn).unwrap();
        }

        let fetched = db.turns.high_importance_turns("alice", 7.0, 5).unwrap();
        assert_eq!(fetched.len(), 5);
        assert_eq!(fetched[0].message, "turn 6");
        assert_eq!(fetched[4].message, "turn 2");
    }

    #[test]
    fn test_recent_turns_oldest_first() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let base = Utc::now();
        for i in 0..4 {
            let mut turn = make_turn("alice", 5.0, MemoryClass::Ephemeral);
            turn.timestamp = base + Duration::seconds(i);
            turn.message = format!("turn {}", i);
            db.turns.insert_turn(&turn).unwrap();
        }

        let recent = db.turns.recent_turns(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "turn 1");
        assert_eq!(recent[2].message, "turn 3");
    }

    #[test]
    fn test_stats_for_user() {
        let db = ContextDatabase::open_in_memory().unwrap();
        db.turns
            .insert_turn(&make_turn("alice", 4.0, MemoryClass::Ephemeral))
            .unwrap();
        db.turns
            .insert_turn(&make_turn("alice", 7.0, MemoryClass::Working))
            .unwrap();
        db.turns
            .insert_turn(&make_turn("alice", 10.0, MemoryClass::LongTerm))
            .unwrap();
        db.turns
            .insert_turn(&make_turn("bob", 1.0, MemoryClass::Ephemeral))
            .unwrap();

        let stats = db.turns.stats_for_user("alice").unwrap();
        assert_eq!(stats.total_turns, 3);
        assert_eq!(stats.memory_distribution.get("ephemeral"), Some(&1));
        assert_eq!(stats.memory_distribution.get("working"), Some(&1));
        assert_eq!(stats.memory_distribution.get("long_term"), Some(&1));
        assert!((stats.average_importance - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_for_unknown_user_are_zero() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let stats = db.turns.stats_for_user("nobody").unwrap();
        assert_eq!(stats.total_turns, 0);
        assert!(stats.memory_distribution.is_empty());
        assert!((stats.average_importance - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expiry_deletes_only_eligible_turns() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let now = Utc::now();

        let mut old_ephemeral = make_turn("alice", 4.0, MemoryClass::Ephemeral);
        old_ephemeral.timestamp = now - Duration::days(31);
        db.turns.insert_turn(&old_ephemeral).unwrap();

        let mut fresh_ephemeral = make_turn("alice", 4.0, MemoryClass::Ephemeral);
        fresh_ephemeral.timestamp = now - Duration::days(29);
        db.turns.insert_turn(&fresh_ephemeral).unwrap();

        let mut old_long_term = make_turn("alice", 9.0, MemoryClass::LongTerm);
        old_long_term.timestamp = now - Duration::days(400);
        db.turns.insert_turn(&old_long_term).unwrap();

        let removed = db
            .turns
            .delete_expired_ephemeral(now - Duration::days(30))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.turns.count_for_user("alice").unwrap(), 2);
    }

    #[test]
    fn test_stale_working_requires_age_and_low_score() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let now = Utc::now();

        // old and low-value: swept
        let mut stale = make_turn("alice", 5.5, MemoryClass::Working);
        stale.timestamp = now - Duration::days(8);
        db.turns.insert_turn(&stale).unwrap();

        // old but at the floor: kept
        let mut valuable = make_turn("alice", 6.0, MemoryClass::Working);
        valuable.timestamp = now - Duration::days(8);
        db.turns.insert_turn(&valuable).unwrap();

        // low-value but recent: kept
        let mut recent = make_turn("alice", 5.5, MemoryClass::Working);
        recent.timestamp = now - Duration::days(2);
        db.turns.insert_turn(&recent).unwrap();

        let removed = db
            .turns
            .delete_stale_working(now - Duration::days(7), 6.0)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.turns.count_for_user("alice").unwrap(), 2);
    }

    // ===== Profile store =====

    #[test]
    fn test_preferences_round_trip() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let mut prefs = BTreeMap::new();
        prefs.insert("language".to_string(), "rust".to_string());
        prefs.insert("editor".to_string(), "helix".to_string());

        db.profiles.set_preferences("alice", &prefs).unwrap();
        assert_eq!(db.profiles.preferences("alice").unwrap(), prefs);
    }

    #[test]
    fn test_preferences_missing_user_is_empty() {
        let db = ContextDatabase::open_in_memory().unwrap();
        assert!(db.profiles.preferences("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_preferences_replace_whole_map() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let mut first = BTreeMap::new();
        first.insert("language".to_string(), "rust".to_string());
        db.profiles.set_preferences("alice", &first).unwrap();

        let mut second = BTreeMap::new();
        second.insert("shell".to_string(), "fish".to_string());
        db.profiles.set_preferences("alice", &second).unwrap();

        let stored = db.profiles.preferences("alice").unwrap();
        assert_eq!(stored, second);
        assert!(!stored.contains_key("language"));
    }

    #[test]
    fn test_corrupt_preferences_json_yields_empty_map() {
        let db = ContextDatabase::open_in_memory().unwrap();
        {
            // the in-memory pool holds one connection; return it before the read
            let conn = db.pool.get().unwrap();
            conn.execute(
                "INSERT INTO user_profiles (user_id, preferences) VALUES (?1, ?2)",
                ["alice", "{not json"],
            )
            .unwrap();
        }

        let prefs = db.profiles.preferences("alice").unwrap();
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_null_preferences_column_yields_empty_map() {
        let db = ContextDatabase::open_in_memory().unwrap();
        {
            let conn = db.pool.get().unwrap();
            conn.execute("INSERT INTO user_profiles (user_id) VALUES (?1)", ["alice"])
                .unwrap();
        }

        assert!(db.profiles.preferences("alice").unwrap().is_empty());
    }

    // ===== Summary store =====

    #[test]
    fn test_summary_archive_round_trip() {
        let db = ContextDatabase::open_in_memory().unwrap();
        let start = Utc::now() - Duration::minutes(10);
        let end = Utc::now();
        db.summaries
            .record("alice", "Topic: database", "database", start, end)
            .unwrap();
        db.summaries
            .record("alice", "Topic: web", "web", start, end)
            .unwrap();

        let latest = db.summaries.latest_for_user("alice", 10).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].summary_text, "Topic: web");
        assert_eq!(latest[1].topic_focus, "database");
        assert_eq!(db.summaries.count_for_user("alice").unwrap(), 2);
        assert_eq!(db.summaries.count_for_user("bob").unwrap(), 0);
    }

    // ===== Read-only handle =====

    #[test]
    fn test_read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.db");
        {
            let db = ContextDatabase::open(&path).unwrap();
            db.turns
                .insert_turn(&make_turn("alice", 7.5, MemoryClass::Working))
                .unwrap();
        }

        let db = ContextDatabase::open_read_only(&path).unwrap();
        let fetched = db.turns.high_importance_turns("alice", 7.0, 5).unwrap();
        assert_eq!(fetched.len(), 1);
        assert!(db
            .turns
            .insert_turn(&make_turn("alice", 7.5, MemoryClass::Working))
            .is_err());
    }
}
