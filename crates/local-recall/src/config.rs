// local-recall/crates/local-recall/src/config.rs

use anyhow::Result;
use std::env;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// SQLite database file backing the context store.
    pub db_path: String,
    /// Capacity of the in-process working set, shared across users.
    pub working_set_capacity: usize,
    /// Default character budget for assembled context strings.
    pub max_context_chars: usize,
    /// Default age in days before ephemeral turns expire.
    pub days_to_keep: i64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            db_path: "context_memory.db".to_string(),
            working_set_capacity: 10,
            max_context_chars: 2000,
            days_to_keep: 30,
        }
    }
}

impl ContextConfig {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!(
                "Failed to load .env file: {}. Using system environment variables.",
                e
            );
        } else {
            info!("Loaded environment variables from .env file");
        }

        let defaults = Self::default();

        Ok(Self {
            db_path: env::var("CONTEXT_DB_PATH").unwrap_or(defaults.db_path),
            working_set_capacity: env::var("WORKING_SET_CAPACITY")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            max_context_chars: env::var("MAX_CONTEXT_CHARS")
                .unwrap_or_else(|_| "2000".into())
                .parse()?,
            days_to_keep: env::var("RETENTION_DAYS")
                .unwrap_or_else(|_| "30".into())
                .parse()?,
        })
    }

    pub fn print_config(&self) {
        info!("Context configuration:");
        info!("  db_path: {}", self.db_path);
        info!("  working_set_capacity: {}", self.working_set_capacity);
        info!("  max_context_chars: {}", self.max_context_chars);
        info!("  days_to_keep: {}", self.days_to_keep);
    }
}
