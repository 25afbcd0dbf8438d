//! Reqwest-backed client for the Aura chat REST surface.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::{event_stream, EventStream};
use crate::error::ChatError;
use crate::registry::ConversationSummary;

use super::traits::ChatTransport;
use super::types::{ChatTurn, ConversationHistory, HealthStatus};

/// Configuration for the Aura API client.
#[derive(Debug)]
pub struct AuraConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Request timeout in seconds, applied to non-streaming calls.
    pub timeout_seconds: Option<u64>,
}

/// Client for the Aura chat backend.
///
/// The client uses `Arc` internally for configuration, making cloning cheap.
#[derive(Debug, Clone)]
pub struct AuraClient {
    /// Shared configuration wrapped in Arc for cheap cloning.
    pub config: Arc<AuraConfig>,
    /// HTTP client for making requests.
    pub client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    content: &'a str,
    conversation_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ConversationsPage {
    conversations: Vec<ConversationSummary>,
}

impl AuraClient {
    pub fn new(base_url: impl Into<String>, timeout_seconds: Option<u64>) -> Self {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.connect_timeout(std::time::Duration::from_secs(sec));
        }
        Self::with_client(
            builder.build().expect("Failed to build reqwest Client"),
            base_url,
            timeout_seconds,
        )
    }

    /// Creates a new Aura client with a custom HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            config: Arc::new(AuraConfig {
                base_url,
                timeout_seconds,
            }),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl ChatTransport for AuraClient {
    async fn chat(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatTurn, ChatError> {
        let body = ChatRequest {
            content,
            conversation_id,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("chat request payload: {json}");
            }
        }

        let mut request = self.client.post(self.url("/chat")).json(&body);

        if let Some(timeout) = self.config.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let resp = request.send().await?;

        log::debug!("chat HTTP status: {}", resp.status());

        let resp = resp.error_for_status()?;

        Ok(resp.json().await?)
    }

    async fn chat_stream(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<EventStream, ChatError> {
        let body = ChatRequest {
            content,
            conversation_id,
        };

        let resp = self
            .client
            .post(self.url("/chat/stream"))
            .json(&body)
            .send()
            .await?;

        log::debug!("chat stream HTTP status: {}", resp.status());

        let resp = resp.error_for_status()?;

        Ok(event_stream(resp))
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let resp = self
            .client
            .get(self.url("/conversations"))
            .send()
            .await?
            .error_for_status()?;

        let page: ConversationsPage = resp.json().await?;
        Ok(page.conversations)
    }

    async fn conversation_history(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationHistory, ChatError> {
        let resp = self
            .client
            .get(self.url(&format!("/conversation/{conversation_id}")))
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ChatError> {
        self.client
            .delete(self.url(&format!("/conversation/{conversation_id}")))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn reset_conversation(&self, conversation_id: &str) -> Result<(), ChatError> {
        self.client
            .post(self.url(&format!("/conversation/{conversation_id}/reset")))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}
