// local-recall/crates/local-recall/src/lib.rs

pub mod config;
pub mod context;
pub mod manager;
pub mod recall;
pub mod retention;
pub mod scoring;
pub mod store;
pub mod summarize;
pub mod telemetry;
pub mod text;
pub mod working_set;

// Public API exports
pub use config::ContextConfig;
pub use manager::{ContextManager, RecordedTurn};
pub use recall::{NullRecall, RecallProvider};
pub use retention::{MemoryClass, RetentionPolicy};
pub use telemetry::init_tracing;

// Component exports
pub use context::{BudgeterConfig, ContextBudgeter, ContextSummary};
pub use scoring::{GoalTaxonomy, ImportanceScorer, TopicTaxonomy};
pub use store::{
    ContextDatabase, ConversationStats, ConversationTurn, ExpiryStats, StoredSummary,
};
pub use summarize::Summarizer;
pub use working_set::WorkingSet;
