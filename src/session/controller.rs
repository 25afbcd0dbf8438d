//! Session controller driving one chat transcript against the backend.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use tokio::sync::broadcast;

use crate::api::{ChatTransport, HealthStatus};
use crate::chat::{ChatMessage, StreamEvent};
use crate::error::ChatError;
use crate::registry::{ConversationRegistry, ConversationSummary};
use crate::store::{StateStore, CONVERSATIONS_KEY};

use super::events::SessionEvent;
use super::state::{SessionPhase, SessionState};

/// Shown in place of a reply when the backend cannot be reached.
pub const SEND_FAILURE_NOTICE: &str =
    "Unable to reach the Aura backend. Check that the server is running.";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Controller for one chat session.
///
/// Cloning yields another handle onto the same session. State mutations are
/// short synchronous critical sections; locks are never held across an
/// await, so readers stay responsive while a reply streams in.
///
/// There is no cancellation. `start_new` and `load` during a stream bump an
/// internal generation counter instead; events still arriving for the old
/// generation are discarded.
#[derive(Clone)]
pub struct ChatSession {
    state: Arc<Mutex<SessionState>>,
    registry: Arc<Mutex<ConversationRegistry>>,
    transport: Arc<dyn ChatTransport>,
    store: StateStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    /// Create a session over `transport`, hydrating the conversation list
    /// from the persisted snapshot in `store`.
    pub fn new(transport: Arc<dyn ChatTransport>, store: StateStore) -> Self {
        let mut registry = ConversationRegistry::new();
        registry.replace_all(store.load(CONVERSATIONS_KEY, Vec::new()));

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            registry: Arc::new(Mutex::new(registry)),
            transport,
            store,
            events,
        }
    }

    /// Send `text` and stream the reply into the transcript.
    ///
    /// Returns `InvalidRequest` when `text` trims to nothing or a reply is
    /// already in flight; the transcript is untouched in both cases.
    /// Transport failures do not surface as errors: the reply placeholder
    /// is replaced with [`SEND_FAILURE_NOTICE`] and the session returns to
    /// idle.
    pub async fn submit(&self, text: &str) -> Result<(), ChatError> {
        let content = text.trim();
        let (generation, conversation_id, placeholder) = self.begin_turn(content)?;

        let mut stream = match self
            .transport
            .chat_stream(content, conversation_id.as_deref())
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("chat stream request failed: {err}");
                self.fail_turn(generation, placeholder);
                return Ok(());
            }
        };

        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::Setup { conversation_id }) => {
                    if !self.apply_setup(generation, conversation_id, content) {
                        return Ok(());
                    }
                }
                Ok(StreamEvent::Content { content }) => {
                    if !self.apply_content(generation, placeholder, &content) {
                        return Ok(());
                    }
                }
                Ok(StreamEvent::Done { .. }) => break,
                Ok(StreamEvent::Error { content: detail }) => {
                    log::warn!("backend reported a stream error: {detail}");
                    self.fail_turn_keeping_partial(generation, placeholder);
                    return Ok(());
                }
                Ok(StreamEvent::Unknown) => {}
                Err(err) => {
                    log::warn!("chat stream failed mid-reply: {err}");
                    self.fail_turn(generation, placeholder);
                    return Ok(());
                }
            }
        }

        // A stream that ends without `done` still terminates the turn.
        self.finish_turn(generation);
        Ok(())
    }

    /// Send `text` and receive the complete reply in one exchange.
    ///
    /// Same preconditions and failure behavior as [`submit`](Self::submit),
    /// with the streaming transitions collapsed into a single step.
    pub async fn submit_buffered(&self, text: &str) -> Result<(), ChatError> {
        let content = text.trim();
        let (generation, conversation_id, placeholder) = self.begin_turn(content)?;

        let turn = match self
            .transport
            .chat(content, conversation_id.as_deref())
            .await
        {
            Ok(turn) => turn,
            Err(err) => {
                log::warn!("chat request failed: {err}");
                self.fail_turn(generation, placeholder);
                return Ok(());
            }
        };

        if !self.apply_setup(generation, turn.conversation_id, content) {
            return Ok(());
        }
        if !self.apply_content(generation, placeholder, &turn.ai_response) {
            return Ok(());
        }
        self.finish_turn(generation);
        Ok(())
    }

    /// Discard the current conversation and return to a blank session.
    ///
    /// Allowed at any time. A reply still streaming for the old
    /// conversation is orphaned, not cancelled; its remaining events are
    /// discarded as they arrive.
    pub fn start_new(&self) {
        let was_streaming = {
            let mut state = self.lock_state();
            let was_streaming = state.phase.is_streaming();
            state.reset();
            was_streaming
        };
        self.lock_registry().set_active(None);

        self.emit(SessionEvent::TranscriptReplaced);
        if was_streaming {
            self.emit(SessionEvent::StreamingChanged(false));
        }
    }

    /// Replace the transcript with the stored history of `conversation_id`.
    ///
    /// On transport failure the error propagates and the session keeps its
    /// previous state.
    pub async fn load(&self, conversation_id: &str) -> Result<(), ChatError> {
        let history = self.transport.conversation_history(conversation_id).await?;

        let was_streaming = {
            let mut state = self.lock_state();
            let was_streaming = state.phase.is_streaming();
            state.reset();
            state.active_id = Some(conversation_id.to_string());
            for entry in &history.messages {
                state.transcript.push(
                    ChatMessage::user(entry.user_message.clone()).with_timestamp(entry.timestamp),
                );
                state.transcript.push(
                    ChatMessage::assistant(entry.ai_response.clone())
                        .with_timestamp(entry.timestamp),
                );
            }
            was_streaming
        };
        self.lock_registry()
            .set_active(Some(conversation_id.to_string()));

        self.emit(SessionEvent::TranscriptReplaced);
        if was_streaming {
            self.emit(SessionEvent::StreamingChanged(false));
        }
        Ok(())
    }

    /// Mirror the server's conversation list into the registry and the
    /// persisted snapshot.
    ///
    /// On failure the error propagates and the cached list stands.
    pub async fn refresh_conversations(&self) -> Result<(), ChatError> {
        let summaries = self.transport.list_conversations().await?;

        let snapshot = {
            let mut registry = self.lock_registry();
            registry.replace_all(summaries);
            registry.list()
        };
        self.store.save(CONVERSATIONS_KEY, &snapshot);

        self.emit(SessionEvent::ConversationsChanged);
        Ok(())
    }

    /// Stash pending input so another handle can submit it later.
    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock_state().draft = text.into();
    }

    /// The stashed pending input.
    pub fn draft(&self) -> String {
        self.lock_state().draft.clone()
    }

    /// Submit the stashed draft, clearing it on acceptance.
    ///
    /// A rejected draft (empty, or submitted mid-stream) stays stashed.
    pub async fn submit_draft(&self) -> Result<(), ChatError> {
        let draft = self.draft();
        self.submit(&draft).await?;
        self.lock_state().draft.clear();
        Ok(())
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock_state().transcript.clone()
    }

    /// Id of the conversation the session points at, if any.
    pub fn active_conversation(&self) -> Option<String> {
        self.lock_state().active_id.clone()
    }

    /// Whether a reply is currently in flight.
    pub fn is_streaming(&self) -> bool {
        self.lock_state().phase.is_streaming()
    }

    /// Cached conversation summaries, most recent first.
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.lock_registry().list()
    }

    /// Backend availability, straight from the transport.
    pub async fn health(&self) -> Result<HealthStatus, ChatError> {
        self.transport.health().await
    }

    /// Subscribe to state-change notifications.
    ///
    /// Only events emitted after subscription are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Validate `content` and append the user message plus its placeholder.
    fn begin_turn(&self, content: &str) -> Result<(u64, Option<String>, usize), ChatError> {
        if content.is_empty() {
            return Err(ChatError::InvalidRequest("message is empty".to_string()));
        }

        let (generation, conversation_id, placeholder) = {
            let mut state = self.lock_state();
            if state.phase.is_streaming() {
                return Err(ChatError::InvalidRequest(
                    "a reply is already streaming".to_string(),
                ));
            }
            let placeholder = state.begin_turn(content);
            (state.generation, state.active_id.clone(), placeholder)
        };

        self.emit(SessionEvent::MessageAppended);
        self.emit(SessionEvent::MessageAppended);
        self.emit(SessionEvent::StreamingChanged(true));
        Ok((generation, conversation_id, placeholder))
    }

    /// Apply a `setup` event; returns `false` when the turn was orphaned.
    ///
    /// The conversation id is adopted at most once. Adoption inserts a
    /// locally-synthesized summary rather than refetching the server list
    /// mid-stream.
    fn apply_setup(&self, generation: u64, id: String, first_message: &str) -> bool {
        let adopted = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return false;
            }
            if state.phase == SessionPhase::AwaitingSetup {
                state.phase = SessionPhase::Streaming;
            }
            if state.active_id.is_none() {
                state.active_id = Some(id.clone());
                true
            } else {
                false
            }
        };

        if adopted {
            let snapshot = {
                let mut registry = self.lock_registry();
                registry.upsert(ConversationSummary::synthesized(id.clone(), first_message));
                registry.set_active(Some(id));
                registry.list()
            };
            self.store.save(CONVERSATIONS_KEY, &snapshot);
            self.emit(SessionEvent::ConversationsChanged);
        }
        true
    }

    /// Append a `content` fragment; returns `false` when the turn was
    /// orphaned.
    fn apply_content(&self, generation: u64, placeholder: usize, fragment: &str) -> bool {
        let content = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return false;
            }
            // The generation check guarantees the index is still valid.
            let message = &mut state.transcript[placeholder];
            message.content.push_str(fragment);
            message.content.clone()
        };

        self.emit(SessionEvent::AssistantUpdated {
            index: placeholder,
            content,
        });
        true
    }

    fn finish_turn(&self, generation: u64) {
        {
            let mut state = self.lock_state();
            if state.generation != generation {
                return;
            }
            state.phase = SessionPhase::Idle;
        }
        self.emit(SessionEvent::StreamingChanged(false));
    }

    fn fail_turn(&self, generation: u64, placeholder: usize) {
        self.end_failed_turn(generation, placeholder, true);
    }

    fn fail_turn_keeping_partial(&self, generation: u64, placeholder: usize) {
        self.end_failed_turn(generation, placeholder, false);
    }

    /// Close the turn after a failure, substituting [`SEND_FAILURE_NOTICE`]
    /// for the reply. With `overwrite_partial` false an already-started
    /// reply keeps its partial content.
    fn end_failed_turn(&self, generation: u64, placeholder: usize, overwrite_partial: bool) {
        let replaced = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return;
            }
            state.phase = SessionPhase::Idle;
            let message = &mut state.transcript[placeholder];
            if overwrite_partial || message.content.is_empty() {
                message.content = SEND_FAILURE_NOTICE.to_string();
                true
            } else {
                false
            }
        };

        if replaced {
            self.emit(SessionEvent::AssistantUpdated {
                index: placeholder,
                content: SEND_FAILURE_NOTICE.to_string(),
            });
        }
        self.emit(SessionEvent::StreamingChanged(false));
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock")
    }

    fn lock_registry(&self) -> MutexGuard<'_, ConversationRegistry> {
        self.registry.lock().expect("registry lock")
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine; rendering is optional.
        let _ = self.events.send(event);
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("ChatSession")
            .field("active_id", &state.active_id)
            .field("phase", &state.phase)
            .field("transcript_len", &state.transcript.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
