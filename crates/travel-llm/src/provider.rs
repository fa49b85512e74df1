use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::stream::StreamEvent;

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Request to an LLM provider. Built by the prompt builder; this crate
/// never constructs prompts itself.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Response from an LLM provider (non-streaming).
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub stop_reason: String,
}

/// Response from an embedding request.
#[derive(Debug, Clone)]
pub struct EmbedResponse {
    pub vector: Vec<f32>,
    pub model: String,
}

/// Common interface for all LLM providers (Anthropic, OpenAI, Ollama).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send a non-streaming chat request, wait for full response.
    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Stream response events through a channel.
    /// Default: falls back to non-streaming send, emits TextDelta + Done.
    async fn send_stream(
        &self,
        req: &ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        let resp = self.send(req).await?;
        let _ = tx.send(StreamEvent::TextDelta { text: resp.content }).await;
        let _ = tx
            .send(StreamEvent::Done {
                model: resp.model,
                tokens_in: resp.tokens_in,
                tokens_out: resp.tokens_out,
                stop_reason: resp.stop_reason,
            })
            .await;
        Ok(())
    }

    /// Embed a piece of text. Providers without embedding support return
    /// `Unavailable` rather than panicking — callers that need embeddings
    /// should route to a provider that implements this.
    async fn embed(&self, _text: &str) -> Result<EmbedResponse, ProviderError> {
        Err(ProviderError::Unavailable(format!(
            "{} does not support embeddings",
            self.name()
        )))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<ProviderError> for travel_core::Error {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Http(err) => travel_core::Error::Unavailable(err.to_string()),
            ProviderError::Api { status, message } if status == 429 => {
                travel_core::Error::ResourceExhausted(message)
            }
            ProviderError::Api { message, .. } => travel_core::Error::Unavailable(message),
            ProviderError::Parse(msg) => travel_core::Error::Internal(msg),
            ProviderError::RateLimited { .. } => {
                travel_core::Error::ResourceExhausted("provider rate limit".to_string())
            }
            ProviderError::Unavailable(msg) => travel_core::Error::Unavailable(msg),
            ProviderError::Cancelled => travel_core::Error::Canceled,
        }
    }
}
