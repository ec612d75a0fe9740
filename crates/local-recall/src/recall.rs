//! Long-term recall capability boundary
//!
//! Vector search over archived conversations belongs to the surrounding
//! application. The manager never calls this trait itself; it exists so
//! callers can wire a recall backend next to `get_context` behind one
//! object-safe seam.

use async_trait::async_trait;

#[async_trait]
pub trait RecallProvider: Send + Sync {
    /// Top-k stored fragments relevant to the query, scoped to one user.
    async fn search(&self, user_id: &str, query: &str, k: usize) -> anyhow::Result<Vec<String>>;
}

/// Recall backend for deployments without a vector store. Every search
/// succeeds with no results.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecall;

#[async_trait]
impl RecallProvider for NullRecall {
    async fn search(&self, _user_id: &str, _query: &str, _k: usize) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
