use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Per-user preference storage. Preferences are an ordered string map so
/// every read and iteration over them is deterministic.
pub struct ProfileStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl ProfileStore {
    pub fn new(pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> anyhow::Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get connection from pool: {}", e))
    }

    /// Preferences for a user. A missing profile row or unreadable JSON
    /// both come back as an empty map.
    pub fn preferences(&self, user_id: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT preferences FROM user_profiles WHERE user_id = ?1")?;
        let mut rows = stmt.query([user_id])?;

        if let Some(row) = rows.next()? {
            let raw: Option<String> = row.get(0)?;
            if let Some(raw) = raw {
                match serde_json::from_str(&raw) {
                    Ok(preferences) => return Ok(preferences),
                    Err(e) => {
                        warn!("Corrupt preferences JSON for user {}: {}", user_id, e);
                    }
                }
            }
        }
        Ok(BTreeMap::new())
    }

    /// Replace the full preference map for a user.
    pub fn set_preferences(
        &self,
        user_id: &str,
        preferences: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        let conn = self.get_conn()?;
        let json = serde_json::to_string(preferences)
            .map_err(|e| anyhow::anyhow!("Preferences JSON error: {}", e))?;
        conn.execute(
            "INSERT OR REPLACE INTO user_profiles (user_id, preferences, last_updated)
             VALUES (?1, ?2, ?3)",
            params![user_id, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
