use crate::store::schema::StoredSummary;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use std::sync::Arc;

/// Append-only archive of per-turn context summaries. Written for audit
/// and debugging; nothing on the context path reads it back.
pub struct SummaryStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl SummaryStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    pub fn record(
        &self,
        user_id: &str,
        summary_text: &str,
        topic_focus: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO context_summaries
             (user_id, summary_text, topic_focus, time_period_start, time_period_end)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                summary_text,
                topic_focus,
                period_start.to_rfc3339(),
                period_end.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent archived summaries for a user, newest first.
    pub fn latest_for_user(&self, user_id: &str, limit: usize) -> anyhow::Result<Vec<StoredSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, summary_text, topic_focus, time_period_start, time_period_end
             FROM context_summaries
             WHERE user_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let mut rows = stmt.query(params![user_id, limit as i64])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(self.row_to_summary(row)?);
        }
        Ok(summaries)
    }

    pub fn count_for_user(&self, user_id: &str) -> anyhow::Result<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM context_summaries WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_summary(&self, row: &Row) -> anyhow::Result<StoredSummary> {
        let parse = |s: String| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| anyhow::anyhow!("Summary timestamp error: {}", e))
        };
        Ok(StoredSummary {
            id: row.get(0)?,
            user_id: row.get(1)?,
            summary_text: row.get(2)?,
            topic_focus: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            time_period_start: parse(row.get(4)?)?,
            time_period_end: parse(row.get(5)?)?,
        })
    }
}
