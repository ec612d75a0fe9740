//! Scoring module - importance heuristics and keyword taxonomies

pub mod importance;
pub mod taxonomy;

pub use importance::{ImportanceScorer, BASE_SCORE, MAX_SCORE, MIN_SCORE};
pub use taxonomy::{
    dominant_tag, GoalTaxonomy, TopicTaxonomy, GENERAL_GOAL, GENERAL_TOPIC, PROGRAMMING_GOAL,
};
