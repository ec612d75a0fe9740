//! Fixed keyword taxonomies for topic tagging and goal inference
//!
//! Table order is load-bearing. Topic tags come out in table order, goal
//! inference takes the first matching entry, and downstream tie-breaks
//! resolve to whichever tag was seen first.

pub const GENERAL_TOPIC: &str = "general";
pub const GENERAL_GOAL: &str = "general_conversation";
pub const PROGRAMMING_GOAL: &str = "programming_assistance";

const DEFAULT_TOPIC_TABLE: [(&str, &[&str]); 7] = [
    ("programming", &["code", "programming", "python", "javascript", "api"]),
    ("ai", &["ai", "artificial intelligence", "machine learning", "model"]),
    ("business", &["business", "strategy", "market", "revenue", "profit"]),
    ("security", &["security", "authentication", "encryption", "password"]),
    ("database", &["database", "sql", "query", "data"]),
    ("web", &["web", "html", "css", "frontend", "backend"]),
    ("deployment", &["deploy", "server", "production", "hosting"]),
];

const DEFAULT_GOAL_TABLE: [(&str, &[&str]); 6] = [
    ("help_request", &["help", "how to", "can you", "please"]),
    ("problem_solving", &["error", "issue", "problem", "fix", "debug"]),
    ("information_seeking", &["what is", "explain", "tell me about", "describe"]),
    ("task_completion", &["create", "build", "make", "generate", "write"]),
    ("configuration", &["setup", "configure", "install", "settings"]),
    ("learning", &["learn", "understand", "tutorial", "guide", "example"]),
];

fn table_to_entries(table: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    table
        .iter()
        .map(|(name, keywords)| {
            (
                name.to_string(),
                keywords.iter().map(|k| k.to_lowercase()).collect(),
            )
        })
        .collect()
}

/// Tags text with every topic whose keyword list matches, in table order.
#[derive(Debug, Clone)]
pub struct TopicTaxonomy {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for TopicTaxonomy {
    fn default() -> Self {
        Self {
            entries: table_to_entries(&DEFAULT_TOPIC_TABLE),
        }
    }
}

impl TopicTaxonomy {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, keywords)| {
                    (name, keywords.into_iter().map(|k| k.to_lowercase()).collect())
                })
                .collect(),
        }
    }

    /// All topics matching the combined exchange text. Matching is
    /// case-insensitive substring search; no match yields an empty vec.
    pub fn tag(&self, message: &str, response: &str) -> Vec<String> {
        let combined = format!("{} {}", message, response).to_lowercase();
        self.entries
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| combined.contains(k.as_str())))
            .map(|(topic, _)| topic.clone())
            .collect()
    }
}

/// Infers a conversation goal from the current message alone.
#[derive(Debug, Clone)]
pub struct GoalTaxonomy {
    entries: Vec<(String, Vec<String>)>,
}

impl Default for GoalTaxonomy {
    fn default() -> Self {
        Self {
            entries: table_to_entries(&DEFAULT_GOAL_TABLE),
        }
    }
}

impl GoalTaxonomy {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, keywords)| {
                    (name, keywords.into_iter().map(|k| k.to_lowercase()).collect())
                })
                .collect(),
        }
    }

    /// First matching goal in table order. Falls back to the tags of the
    /// user's last recent turn: a programming tag there means the user is
    /// likely still coding even when the message itself says nothing.
    pub fn infer(&self, message: &str, last_turn_tags: Option<&[String]>) -> String {
        let lower = message.to_lowercase();
        for (goal, keywords) in &self.entries {
            if keywords.iter().any(|k| lower.contains(k.as_str())) {
                return goal.clone();
            }
        }

        if let Some(tags) = last_turn_tags {
            if tags.iter().any(|t| t == "programming" || t == "code") {
                return PROGRAMMING_GOAL.to_string();
            }
        }

        GENERAL_GOAL.to_string()
    }
}

/// Most frequent tag in the slice; ties resolve to the tag encountered
/// first. Deterministic for any input order.
pub fn dominant_tag(tags: &[String]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for tag in tags {
        let count = tags.iter().filter(|t| t.as_str() == tag.as_str()).count();
        let replace = match best {
            Some((_, best_count)) => count > best_count,
            None => true,
        };
        if replace {
            best = Some((tag.as_str(), count));
        }
    }
    best.map(|(tag, _)| tag)
}
