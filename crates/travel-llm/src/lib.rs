pub mod anthropic;
pub mod anthropic_stream;
pub mod health;
pub mod health_wrapper;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod router;
pub mod stream;

pub use anthropic::AnthropicProvider;
pub use health::{HealthTracker, ProviderHealthEntry, ProviderStatus};
pub use health_wrapper::HealthTrackingProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{ChatRequest, ChatResponse, EmbedResponse, LlmProvider, Message, ProviderError, Role};
pub use router::{ProviderRouter, ProviderSlot};
pub use stream::StreamEvent;
