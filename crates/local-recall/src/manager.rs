use crate::config::ContextConfig;
use crate::context::{BudgeterConfig, ContextBudgeter, ContextSummary};
use crate::retention::{MemoryClass, RetentionPolicy};
use crate::scoring::{dominant_tag, GoalTaxonomy, ImportanceScorer, TopicTaxonomy, GENERAL_TOPIC};
use crate::store::{
    ContextDatabase, ConversationStats, ConversationTurn, ExpiryStats, StoredSummary,
};
use crate::summarize::Summarizer;
use crate::text::TextUtils;
use crate::working_set::WorkingSet;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Durable turns below or at this score never feed key facts.
pub const KEY_FACT_SCORE_FLOOR: f64 = 7.0;
/// How many durable turns to pull when building key facts.
pub const KEY_FACT_FETCH_LIMIT: usize = 5;
pub const MAX_KEY_FACTS: usize = 3;

const RECENT_CONTEXT_TURNS: usize = 2;
const RECENT_CONTEXT_SCORE_FLOOR: f64 = 6.0;
const RECENT_CONTEXT_MAX_CHARS: usize = 500;
const RECENT_SNIPPET_CHARS: usize = 50;

/// Outcome of recording a turn. The turn always carries its computed
/// metadata; `persisted` is false when the store write failed, in which
/// case the turn still lives in the working set.
#[derive(Debug, Clone)]
pub struct RecordedTurn {
    pub turn: ConversationTurn,
    pub persisted: bool,
}

/// Facade over the store, scorer, working set, summarizer, and budgeter.
///
/// Holds no global state: every instance owns its working set and shares
/// the database it was built over. All scoring and assembly is
/// deterministic, so identical store state and arguments give identical
/// context strings.
pub struct ContextManager {
    database: Arc<ContextDatabase>,
    working_set: WorkingSet,
    scorer: ImportanceScorer,
    topics: TopicTaxonomy,
    goals: GoalTaxonomy,
    summarizer: Summarizer,
    budgeter: ContextBudgeter,
    config: ContextConfig,
}

impl ContextManager {
    pub fn new(config: ContextConfig) -> anyhow::Result<Self> {
        let database = Arc::new(ContextDatabase::open(Path::new(&config.db_path))?);
        info!("Context manager initialized");
        Ok(Self::with_database(database, config))
    }

    /// Build a manager over an already-open database. Used by tests and by
    /// callers sharing one database between managers.
    pub fn with_database(database: Arc<ContextDatabase>, config: ContextConfig) -> Self {
        Self {
            working_set: WorkingSet::new(config.working_set_capacity),
            scorer: ImportanceScorer::default(),
            topics: TopicTaxonomy::default(),
            goals: GoalTaxonomy::default(),
            summarizer: Summarizer::default(),
            budgeter: ContextBudgeter::new(BudgeterConfig {
                max_chars: config.max_context_chars,
                ..BudgeterConfig::default()
            }),
            database,
            config,
        }
    }

    pub fn database(&self) -> &Arc<ContextDatabase> {
        &self.database
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    /// Score, tag, classify, and store one message/response exchange.
    ///
    /// Never fails: a store outage downgrades the result to
    /// `persisted: false` and the turn still enters the working set so the
    /// live conversation keeps its recency context.
    pub async fn record_turn(&self, user_id: &str, message: &str, response: &str) -> RecordedTurn {
        let timestamp = Utc::now();
        let importance_score = self.scorer.score(message, response);
        let topic_tags = self.topics.tag(message, response);
        let memory_class = MemoryClass::classify(importance_score);

        // summary of the conversation as it stood before this turn,
        // built only from this user's turns
        let recent = self.working_set.recent_for(user_id);
        let context_summary = self.summarizer.summarize(&recent);

        let turn = ConversationTurn {
            user_id: user_id.to_string(),
            message: message.to_string(),
            response: response.to_string(),
            timestamp,
            content_hash: content_hash(message, timestamp),
            context_summary,
            importance_score,
            topic_tags,
            memory_class,
        };

        let persisted = match self.database.turns.insert_turn(&turn) {
            Ok(_) => {
                self.archive_summary(&turn, &recent);
                true
            }
            Err(e) => {
                warn!("Failed to persist turn for user {}: {}", user_id, e);
                false
            }
        };

        self.working_set.append(turn.clone());
        info!(
            "Recorded turn for user {} (importance {:.1}, class {})",
            user_id, importance_score, memory_class
        );
        RecordedTurn { turn, persisted }
    }

    /// Bounded context string for the next model call. `max_chars` falls
    /// back to the configured budget when not given.
    pub async fn get_context(
        &self,
        user_id: &str,
        current_message: &str,
        max_chars: Option<usize>,
    ) -> anyhow::Result<String> {
        let max_chars = max_chars.unwrap_or_else(|| self.budgeter.default_max_chars());
        let summary = self.relevant_context(user_id, current_message).await?;
        Ok(self.budgeter.assemble(&summary, current_message, max_chars))
    }

    /// Structured context for one user and message: topic, durable facts,
    /// matching preferences, recent snippets, and the inferred goal.
    pub async fn relevant_context(
        &self,
        user_id: &str,
        current_message: &str,
    ) -> anyhow::Result<ContextSummary> {
        let recent_turns = self.working_set.recent_for(user_id);
        let history = self.database.turns.high_importance_turns(
            user_id,
            KEY_FACT_SCORE_FLOOR,
            KEY_FACT_FETCH_LIMIT,
        )?;

        let current_tags = self.topics.tag(current_message, "");
        let current_topic = dominant_tag(&current_tags)
            .unwrap_or(GENERAL_TOPIC)
            .to_string();

        let mut key_facts = Vec::new();
        for turn in &history {
            let sentence = TextUtils::first_sentence(&turn.response);
            let fact = TextUtils::truncate_chars(sentence, 100);
            if TextUtils::count_chars(fact) > 20 {
                key_facts.push(fact.to_string());
                if key_facts.len() == MAX_KEY_FACTS {
                    break;
                }
            }
        }

        let message_lower = current_message.to_lowercase();
        let user_preferences: BTreeMap<String, String> = self
            .database
            .profiles
            .preferences(user_id)?
            .into_iter()
            .filter(|(key, _)| message_lower.contains(&key.to_lowercase()))
            .collect();

        let recent_context = render_recent_context(&recent_turns);
        let conversation_goal = self
            .goals
            .infer(current_message, recent_turns.last().map(|t| t.topic_tags.as_slice()));

        debug!(
            "Context summary for user {}: topic {}, {} facts, {} preferences",
            user_id,
            current_topic,
            key_facts.len(),
            user_preferences.len()
        );

        Ok(ContextSummary {
            current_topic,
            key_facts,
            user_preferences,
            recent_context,
            conversation_goal,
        })
    }

    pub async fn preferences(&self, user_id: &str) -> anyhow::Result<BTreeMap<String, String>> {
        self.database.profiles.preferences(user_id)
    }

    /// Replace the user's stored preferences with the given map.
    pub async fn set_preferences(
        &self,
        user_id: &str,
        preferences: &BTreeMap<String, String>,
    ) -> anyhow::Result<()> {
        self.database.profiles.set_preferences(user_id, preferences)
    }

    /// One retention sweep. Scheduling belongs to the caller; nothing here
    /// runs on a timer.
    pub async fn run_expiry(&self, days_to_keep: Option<i64>) -> anyhow::Result<ExpiryStats> {
        let policy = RetentionPolicy {
            days_to_keep: days_to_keep.unwrap_or(self.config.days_to_keep),
            ..RetentionPolicy::default()
        };
        let now = Utc::now();

        let ephemeral_removed = self
            .database
            .turns
            .delete_expired_ephemeral(now - Duration::days(policy.days_to_keep))?;
        let stale_working_removed = self.database.turns.delete_stale_working(
            now - Duration::days(policy.working_days),
            policy.working_score_floor,
        )?;

        let stats = ExpiryStats {
            ephemeral_removed,
            stale_working_removed,
        };
        info!(
            "Expiry sweep removed {} turns ({} ephemeral, {} stale working)",
            stats.total(),
            stats.ephemeral_removed,
            stats.stale_working_removed
        );
        Ok(stats)
    }

    pub async fn stats(&self, user_id: &str) -> anyhow::Result<ConversationStats> {
        let mut stats = self.database.turns.stats_for_user(user_id)?;
        stats.working_set_len = self.working_set.len();
        Ok(stats)
    }

    /// Archived context summaries for a user, newest first.
    pub async fn summary_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<StoredSummary>> {
        self.database.summaries.latest_for_user(user_id, limit)
    }

    /// Warm the working set from the newest stored turns, replacing its
    /// current contents. Returns the number of turns loaded.
    pub async fn rebuild_working_set(&self) -> anyhow::Result<usize> {
        let turns = self
            .database
            .turns
            .recent_turns(self.config.working_set_capacity)?;
        let count = turns.len();
        self.working_set.rebuild(turns);
        debug!("Rebuilt working set with {} turns", count);
        Ok(count)
    }

    fn archive_summary(&self, turn: &ConversationTurn, recent: &[ConversationTurn]) {
        let period_start = recent
            .first()
            .map(|t| t.timestamp)
            .unwrap_or(turn.timestamp);
        let topic_focus = self.summarizer.topic(recent);
        // audit trail only; a failed archive never fails the turn
        if let Err(e) = self.database.summaries.record(
            &turn.user_id,
            &turn.context_summary,
            &topic_focus,
            period_start,
            turn.timestamp,
        ) {
            debug!("Failed to archive summary for user {}: {}", turn.user_id, e);
        }
    }
}

/// Render the last couple of recent turns as clipped snippets. Turns at or
/// below the score floor are left out.
fn render_recent_context(recent_turns: &[ConversationTurn]) -> String {
    let start = recent_turns.len().saturating_sub(RECENT_CONTEXT_TURNS);
    let parts: Vec<String> = recent_turns[start..]
        .iter()
        .filter(|turn| turn.importance_score > RECENT_CONTEXT_SCORE_FLOOR)
        .map(|turn| {
            let message = TextUtils::normalize_whitespace(&turn.message);
            let response = TextUtils::normalize_whitespace(&turn.response);
            format!(
                "User: {}... | AI: {}...",
                TextUtils::truncate_chars(&message, RECENT_SNIPPET_CHARS),
                TextUtils::truncate_chars(&response, RECENT_SNIPPET_CHARS),
            )
        })
        .collect();
    TextUtils::truncate_chars(&parts.join(" || "), RECENT_CONTEXT_MAX_CHARS).to_string()
}

/// Stable fingerprint of a turn's message and timestamp.
fn content_hash(message: &str, timestamp: DateTime<Utc>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(message.as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.finalize().to_hex().to_string()
}
