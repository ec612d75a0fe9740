use crate::retention::MemoryClass;
use crate::store::schema::*;
use chrono::{DateTime, NaiveDateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Append-only log of conversation turns.
pub struct TurnStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl TurnStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Insert a turn and return its rowid.
    pub fn insert_turn(&self, turn: &ConversationTurn) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO conversation_turns
             (user_id, message, response, timestamp, content_hash, context_summary,
              importance_score, topic_tags, memory_class)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                turn.user_id,
                turn.message,
                turn.response,
                turn.timestamp.to_rfc3339(),
                turn.content_hash,
                turn.context_summary,
                turn.importance_score,
                serde_json::to_string(&turn.topic_tags)
                    .map_err(|e| anyhow::anyhow!("Topic tags JSON error: {}", e))?,
                turn.memory_class.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Durable history for one user: turns scoring above `min_score` in the
    /// working or long-term tiers, newest first.
    pub fn high_importance_turns(
        &self,
        user_id: &str,
        min_score: f64,
        limit: usize,
    ) -> anyhow::Result<Vec<ConversationTurn>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, message, response, timestamp, content_hash, context_summary,
                    importance_score, topic_tags, memory_class
             FROM conversation_turns
             WHERE user_id = ?1 AND importance_score > ?2
               AND memory_class IN ('working', 'long_term')
             ORDER BY timestamp DESC, id DESC
             LIMIT ?3",
        )?;
        let mut rows = stmt.query(params![user_id, min_score, limit as i64])?;
        let mut turns = Vec::new();
        while let Some(row) = rows.next()? {
            turns.push(self.row_to_turn(row)?);
        }
        Ok(turns)
    }

    /// Newest turns across all users, returned oldest first so a caller can
    /// replay them in arrival order.
    pub fn recent_turns(&self, limit: usize) -> anyhow::Result<Vec<ConversationTurn>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, message, response, timestamp, content_hash, context_summary,
                    importance_score, topic_tags, memory_class
             FROM conversation_turns
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![limit as i64])?;
        let mut turns = Vec::new();
        while let Some(row) = rows.next()? {
            turns.push(self.row_to_turn(row)?);
        }
        turns.reverse();
        Ok(turns)
    }

    pub fn count_for_user(&self, user_id: &str) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM conversation_turns WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Totals, per-class distribution, and mean importance for one user.
    /// `working_set_len` is left at zero for the manager to fill.
    pub fn stats_for_user(&self, user_id: &str) -> anyhow::Result<ConversationStats> {
        let conn = self.get_conn()?;

        let (total_turns, average_importance): (i64, f64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(AVG(importance_score), 0.0)
             FROM conversation_turns WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT memory_class, COUNT(*) FROM conversation_turns
             WHERE user_id = ?1 GROUP BY memory_class",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut memory_distribution = HashMap::new();
        while let Some(row) = rows.next()? {
            let class: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            memory_distribution.insert(class, count);
        }

        Ok(ConversationStats {
            total_turns,
            memory_distribution,
            average_importance,
            working_set_len: 0,
        })
    }

    /// Delete ephemeral turns older than the cutoff. Returns rows removed.
    pub fn delete_expired_ephemeral(&self, cutoff: DateTime<Utc>) -> anyhow::Result<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM conversation_turns
             WHERE memory_class = 'ephemeral' AND timestamp < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        if deleted > 0 {
            debug!("Removed {} expired ephemeral turns", deleted);
        }
        Ok(deleted)
    }

    /// Delete working turns older than the cutoff whose score sits below
    /// the floor. Long-term turns are never touched.
    pub fn delete_stale_working(
        &self,
        cutoff: DateTime<Utc>,
        score_floor: f64,
    ) -> anyhow::Result<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM conversation_turns
             WHERE memory_class = 'working' AND timestamp < ?1 AND importance_score < ?2",
            params![cutoff.to_rfc3339(), score_floor],
        )?;
        if deleted > 0 {
            debug!("Removed {} stale working turns", deleted);
        }
        Ok(deleted)
    }

    fn parse_datetime_safe(datetime_str: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
        None
    }

    fn row_to_turn(&self, row: &Row) -> anyhow::Result<ConversationTurn> {
        let timestamp = Self::parse_datetime_safe(&row.get::<_, String>(3)?)
            .unwrap_or_else(|| {
                warn!("Failed to parse turn timestamp");
                Utc::now()
            });

        let tags_json: String = row.get(7)?;
        let topic_tags: Vec<String> = serde_json::from_str(&tags_json)
            .map_err(|e| anyhow::anyhow!("Topic tags JSON error: {}", e))?;

        let class_str: String = row.get(8)?;
        let memory_class = MemoryClass::parse(&class_str)
            .ok_or_else(|| anyhow::anyhow!("Unknown memory class: {}", class_str))?;

        Ok(ConversationTurn {
            user_id: row.get(0)?,
            message: row.get(1)?,
            response: row.get(2)?,
            timestamp,
            content_hash: row.get(4)?,
            context_summary: row.get(5)?,
            importance_score: row.get(6)?,
            topic_tags,
            memory_class,
        })
    }
}
