use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::health::HealthTracker;
use crate::provider::{ChatRequest, ChatResponse, EmbedResponse, LlmProvider, ProviderError};
use crate::stream::StreamEvent;

/// Decorates a provider with passive health recording. Every call's outcome
/// and latency feeds the shared [`HealthTracker`]; the wrapped provider's
/// own retry/failover behavior is untouched.
pub struct HealthTrackingProvider {
    inner: Box<dyn LlmProvider>,
    tracker: Arc<HealthTracker>,
}

impl HealthTrackingProvider {
    pub fn new(inner: Box<dyn LlmProvider>, tracker: Arc<HealthTracker>) -> Self {
        Self { inner, tracker }
    }
}

#[async_trait]
impl LlmProvider for HealthTrackingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let start = Instant::now();
        let result = self.inner.send(req).await;
        self.record(start, &result);
        result
    }

    async fn send_stream(
        &self,
        req: &ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), ProviderError> {
        let start = Instant::now();
        let result = self.inner.send_stream(req, tx).await;
        self.record(start, &result);
        result
    }

    async fn embed(&self, text: &str) -> Result<EmbedResponse, ProviderError> {
        let start = Instant::now();
        let result = self.inner.embed(text).await;
        self.record(start, &result);
        result
    }
}

impl HealthTrackingProvider {
    fn record<T>(&self, start: Instant, result: &Result<T, ProviderError>) {
        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(_) => self.tracker.record_success(self.inner.name(), latency_ms),
            Err(e) => self.tracker.record_error(self.inner.name(), e),
        }
    }
}
