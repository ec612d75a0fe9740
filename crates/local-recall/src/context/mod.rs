//! Context assembly module - summary building and budget enforcement

pub mod budgeter;
pub mod summary;

pub use budgeter::{BudgeterConfig, ContextBudgeter, DEFAULT_MAX_CHARS};
pub use summary::ContextSummary;
