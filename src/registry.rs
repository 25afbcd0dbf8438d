//! In-memory mirror of the backend's conversation list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one conversation, as listed in the sidebar.
///
/// The same shape travels on the wire (`GET /conversations`) and into the
/// local persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Server-assigned identifier
    pub id: String,
    /// Display title, derived from the first user message
    pub title: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation last changed, if the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of stored exchanges
    #[serde(default)]
    pub messages_count: u64,
}

impl ConversationSummary {
    /// Synthesize a summary for a conversation the server just created.
    ///
    /// The title mirrors the backend's own titling rule: the first user
    /// message truncated to 50 characters.
    pub fn synthesized(id: impl Into<String>, first_message: &str) -> Self {
        Self {
            id: id.into(),
            title: truncate_title(first_message),
            created_at: Utc::now(),
            updated_at: None,
            messages_count: 1,
        }
    }
}

const TITLE_MAX_CHARS: usize = 50;

fn truncate_title(text: &str) -> String {
    text.chars().take(TITLE_MAX_CHARS).collect()
}

/// Ordered, most-recent-first collection of conversation summaries.
///
/// Ids are unique within the collection. Existing summaries are never
/// edited in place; the mirror is refreshed wholesale from the server list.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    entries: Vec<ConversationSummary>,
    active: Option<String>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all summaries, most recent first.
    pub fn list(&self) -> Vec<ConversationSummary> {
        self.entries.clone()
    }

    /// Insert a summary at the front if its id is new; no-op otherwise.
    pub fn upsert(&mut self, summary: ConversationSummary) {
        if self.entries.iter().any(|c| c.id == summary.id) {
            return;
        }
        self.entries.insert(0, summary);
    }

    /// Replace the whole mirror with a fresh server list.
    ///
    /// Later duplicates of an id are dropped to keep ids unique.
    pub fn replace_all(&mut self, summaries: Vec<ConversationSummary>) {
        self.entries.clear();
        for summary in summaries {
            if self.entries.iter().any(|c| c.id == summary.id) {
                continue;
            }
            self.entries.push(summary);
        }
    }

    /// Look up a summary by id.
    pub fn get(&self, id: &str) -> Option<&ConversationSummary> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// Track which conversation the session currently points at.
    pub fn set_active(&mut self, id: Option<String>) {
        self.active = id;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
