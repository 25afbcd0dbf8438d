//! Mutable state behind a chat session handle.

use crate::chat::ChatMessage;

/// Lifecycle of the in-flight exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No exchange in flight.
    #[default]
    Idle,
    /// Request sent for a conversation with no id yet; waiting for the
    /// backend to announce one.
    AwaitingSetup,
    /// Reply fragments are arriving.
    Streaming,
}

impl SessionPhase {
    /// Whether an exchange is in flight.
    pub fn is_streaming(self) -> bool {
        !matches!(self, SessionPhase::Idle)
    }
}

#[derive(Debug, Default)]
pub(super) struct SessionState {
    pub active_id: Option<String>,
    pub transcript: Vec<ChatMessage>,
    pub phase: SessionPhase,
    pub draft: String,
    pub generation: u64,
}

impl SessionState {
    /// Append the user message and its empty reply placeholder.
    ///
    /// Returns the placeholder's transcript index.
    pub fn begin_turn(&mut self, content: &str) -> usize {
        self.transcript.push(ChatMessage::user(content));
        self.transcript.push(ChatMessage::assistant(""));
        self.phase = if self.active_id.is_some() {
            SessionPhase::Streaming
        } else {
            SessionPhase::AwaitingSetup
        };
        self.transcript.len() - 1
    }

    /// Drop everything tied to the current conversation.
    ///
    /// Bumping the generation orphans any stream still delivering events
    /// for the old transcript.
    pub fn reset(&mut self) {
        self.active_id = None;
        self.transcript.clear();
        self.phase = SessionPhase::Idle;
        self.generation += 1;
    }
}
