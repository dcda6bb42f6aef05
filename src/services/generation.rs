//! Text generation contract and HTTP adapter.
//!
//! Requests use the chat-completions shape (role + content messages) and are posted to
//! `{base}/model/{model_id}/invoke`. Responses expose one or more `choices`, each carrying a
//! message whose content is the generated text.

use crate::services::http::{HttpTransport, encode_path};
use crate::services::types::{GenerationClientError, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Behavioral instructions.
    System,
    /// Task and document content.
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// System-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// User-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Request body sent to the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier echoed into the body.
    pub model: String,
    /// Conversation, system message first.
    pub messages: Vec<ChatMessage>,
    /// Output-length ceiling.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
}

/// Response body returned by the generator.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Candidate completions; the pipeline reads the first.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One candidate completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Generated message.
    pub message: ChoiceMessage,
}

/// Message payload inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Generated text, absent when the model returned nothing.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Interface implemented by text generation backends.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Invoke `model_id` with a chat request.
    async fn invoke(
        &self,
        model_id: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, GenerationClientError>;
}

/// HTTP adapter for a hosted generation runtime.
pub struct HttpGenerationClient {
    transport: HttpTransport,
}

impl HttpGenerationClient {
    /// Build an adapter rooted at `base_url`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(base_url, api_key, "rusty-doc/summary")?;
        tracing::debug!(url = %transport.base_url, "Initialized generation client");
        Ok(Self { transport })
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn invoke(
        &self,
        model_id: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, GenerationClientError> {
        let path = format!("model/{}/invoke", encode_path(model_id));
        let response = self
            .transport
            .send(self.transport.request(Method::POST, &path).json(request))
            .await?;

        response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode generation response: {error}"
            ))
        })
    }
}
