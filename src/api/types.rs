use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Completed exchange returned by the non-streaming chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    /// Conversation the exchange was filed under (server-assigned on first use)
    pub conversation_id: String,
    /// Full assistant reply
    pub ai_response: String,
    /// Server-side timestamp of the exchange
    pub timestamp: DateTime<Utc>,
}

/// One stored exchange inside a conversation history.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    /// What the user sent
    pub user_message: String,
    /// What the assistant answered
    pub ai_response: String,
    /// When the exchange was stored
    pub timestamp: DateTime<Utc>,
}

/// Full history of one conversation as served by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationHistory {
    /// Stored exchanges in insertion order
    pub messages: Vec<HistoryEntry>,
    /// Total number of stored exchanges
    #[serde(default)]
    pub total_messages: u64,
}

/// Backend health report.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    /// Overall service status string
    #[serde(default)]
    pub status: String,
    /// Whether the model behind the backend is ready to answer
    #[serde(default)]
    pub ai_model_ready: bool,
}
