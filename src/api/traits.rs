use async_trait::async_trait;

use crate::chat::EventStream;
use crate::error::ChatError;
use crate::registry::ConversationSummary;

use super::types::{ChatTurn, ConversationHistory, HealthStatus};

/// Trait over the chat backend's REST surface.
///
/// The session controller only depends on this trait, so tests can drive it
/// with scripted transports and no network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a message and receive the complete reply in one step.
    async fn chat(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatTurn, ChatError>;

    /// Send a message and receive the reply as a stream of events.
    async fn chat_stream(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<EventStream, ChatError>;

    /// List conversation summaries, most recently updated first.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError>;

    /// Fetch the full stored history of one conversation.
    async fn conversation_history(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationHistory, ChatError>;

    /// Delete a conversation and its messages.
    async fn delete_conversation(&self, _conversation_id: &str) -> Result<(), ChatError> {
        Err(ChatError::Generic(
            "Deletion not supported for this transport".to_string(),
        ))
    }

    /// Clear a conversation's messages while keeping the conversation.
    async fn reset_conversation(&self, _conversation_id: &str) -> Result<(), ChatError> {
        Err(ChatError::Generic(
            "Reset not supported for this transport".to_string(),
        ))
    }

    /// Check backend and model availability.
    async fn health(&self) -> Result<HealthStatus, ChatError> {
        Err(ChatError::Generic(
            "Health check not supported for this transport".to_string(),
        ))
    }
}
