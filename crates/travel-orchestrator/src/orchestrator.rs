use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::instrument;

use travel_cache::CacheStore;
use travel_intent::{Intent, IntentType};
use travel_llm::LlmProvider;
use travel_prompt::PromptBuilder;
use travel_protocol::{EventPayload, StreamEvent};
use travel_sessions::SessionContext;
use travel_users::User;

use crate::navigation::build_navigation;
use crate::shared::SharedState;
use crate::worker::{run_worker, WorkerConfig};

pub struct OrchestratorConfig {
    pub model: String,
    pub max_tokens: u32,
    /// TTL for parts whose content doesn't depend on the caller (§9 open
    /// question decision #2).
    pub deterministic_ttl_secs: u64,
    /// TTL for parts keyed to a specific caller's profile — defaults to 0
    /// (no caching) since a shared fingerprint for personalized content
    /// would otherwise leak between users.
    pub personalized_ttl_secs: u64,
    pub send_event_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            max_tokens: 1024,
            deterministic_ttl_secs: 3600,
            personalized_ttl_secs: 0,
            send_event_timeout: Duration::from_secs(2),
        }
    }
}

/// Fan-out orchestrator (C5) plus the completion half of the event
/// multiplexer's invariants (C6) — the channel itself is owned by the
/// caller; this only ever sends.
pub struct Orchestrator {
    cache: Arc<CacheStore>,
    provider: Arc<dyn LlmProvider>,
    prompt_builder: Arc<PromptBuilder>,
    cfg: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<CacheStore>,
        provider: Arc<dyn LlmProvider>,
        prompt_builder: Arc<PromptBuilder>,
        cfg: OrchestratorConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            prompt_builder,
            cfg,
        }
    }

    /// Runs one classified turn to completion, emitting `start`, per-worker
    /// `chunk`/terminal events, and a final `navigation` + `complete` pair
    /// (or a single top-level `error` if every worker failed). Never
    /// closes `out_tx` — that responsibility belongs to whoever owns the
    /// channel.
    #[instrument(skip_all, fields(intent = %intent.intent_type))]
    pub async fn run(
        &self,
        intent: &Intent,
        session_context: &SessionContext,
        user: &User,
        city_id: &str,
        city_name: &str,
        out_tx: mpsc::Sender<StreamEvent>,
    ) {
        let next_event_id = Arc::new(AtomicU64::new(0));
        let next_id = || next_event_id.fetch_add(1, Ordering::SeqCst);

        let _ = out_tx.send(StreamEvent::new(next_id(), EventPayload::Start)).await;
        let _ = out_tx
            .send(StreamEvent::new(
                next_id(),
                EventPayload::DomainDetected {
                    intent: intent.intent_type.to_string(),
                    confidence: intent.confidence,
                },
            ))
            .await;

        if intent.intent_type == IntentType::Cancel {
            let _ = out_tx
                .send(StreamEvent::new(
                    next_id(),
                    EventPayload::Message {
                        text: "Okay, cancelled.".to_string(),
                    },
                ))
                .await;
            let _ = out_tx.send(StreamEvent::new(next_id(), EventPayload::Complete)).await;
            return;
        }

        let prompts = self.prompt_builder.build(intent, session_context, user);
        if prompts.is_empty() {
            let _ = out_tx.send(StreamEvent::new(next_id(), EventPayload::Complete)).await;
            return;
        }

        let user_fp = travel_prompt::user_profile_fingerprint(user, session_context);
        let shared = Arc::new(SharedState::new());
        let worker_cfg = Arc::new(WorkerConfig {
            model: self.cfg.model.clone(),
            max_tokens: self.cfg.max_tokens,
            deterministic_ttl_secs: self.cfg.deterministic_ttl_secs,
            personalized_ttl_secs: self.cfg.personalized_ttl_secs,
            send_event_timeout: self.cfg.send_event_timeout,
        });

        for prompt in &prompts {
            let _ = out_tx
                .send(StreamEvent::new(
                    next_id(),
                    EventPayload::PromptGenerated {
                        part_type: prompt.part_type.clone(),
                    },
                ))
                .await;
        }

        let handles: Vec<_> = prompts
            .into_iter()
            .map(|prompt| {
                tokio::spawn(run_worker(
                    prompt,
                    user_fp.clone(),
                    city_id.to_string(),
                    self.cache.clone(),
                    self.provider.clone(),
                    shared.clone(),
                    worker_cfg.clone(),
                    out_tx.clone(),
                    next_event_id.clone(),
                ))
            })
            .collect();

        let mut any_succeeded = false;
        for handle in handles {
            match handle.await {
                Ok(outcome) => any_succeeded |= outcome.succeeded,
                Err(join_err) => {
                    tracing::warn!(err = %join_err, "fan-out worker task panicked");
                }
            }
        }

        if !any_succeeded {
            let _ = out_tx
                .send(StreamEvent::new(
                    next_id(),
                    EventPayload::Error {
                        part_type: None,
                        code: "unavailable".to_string(),
                        message: "all fan-out workers failed".to_string(),
                    },
                ))
                .await;
            return;
        }

        let responses = shared.snapshot_responses();
        let nav = build_navigation(intent, &responses, city_id, city_name);
        let _ = out_tx.send(StreamEvent::new(next_id(), nav)).await;
        let _ = out_tx.send(StreamEvent::new(next_id(), EventPayload::Complete)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rusqlite::Connection;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use travel_core::types::UserRole;
    use travel_llm::{ChatRequest, ChatResponse, ProviderError};

    struct FixedProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatResponse {
                content: format!("answer for {}", req.messages[0].content),
                model: req.model.clone(),
                tokens_in: 10,
                tokens_out: 10,
                stop_reason: "stop".to_string(),
            })
        }
    }

    fn test_user() -> User {
        User {
            id: "user-1".to_string(),
            email: "a@example.com".to_string(),
            display_name: "Ada".to_string(),
            role: UserRole::User,
            password_hash: "x".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn cache_store() -> CacheStore {
        let conn = Connection::open_in_memory().unwrap();
        travel_cache::db::init_db(&conn).unwrap();
        CacheStore::new(conn)
    }

    #[tokio::test]
    async fn itinerary_run_emits_start_then_per_part_terminals_then_complete() {
        let orchestrator = Orchestrator::new(
            Arc::new(cache_store()),
            Arc::new(FixedProvider { calls: AtomicUsize::new(0) }),
            Arc::new(PromptBuilder::new()),
            OrchestratorConfig::default(),
        );

        let intent = Intent {
            intent_type: IntentType::Itinerary,
            confidence: 0.95,
            entities: HashMap::new(),
            required_action: None,
        };
        let (tx, mut rx) = mpsc::channel(64);
        orchestrator
            .run(&intent, &SessionContext::default(), &test_user(), "city-lisbon", "Lisbon", tx)
            .await;

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }

        assert!(matches!(events.first().unwrap().payload, EventPayload::Start));
        assert!(matches!(events.last().unwrap().payload, EventPayload::Complete));
        assert!(events.last().unwrap().is_final);

        let complete_count = events
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::Complete))
            .count();
        assert_eq!(complete_count, 1);
    }

    #[tokio::test]
    async fn cancel_intent_short_circuits_without_spawning_workers() {
        let orchestrator = Orchestrator::new(
            Arc::new(cache_store()),
            Arc::new(FixedProvider { calls: AtomicUsize::new(0) }),
            Arc::new(PromptBuilder::new()),
            OrchestratorConfig::default(),
        );

        let (tx, mut rx) = mpsc::channel(16);
        orchestrator
            .run(&Intent::cancel(), &SessionContext::default(), &test_user(), "city-lisbon", "Lisbon", tx)
            .await;

        let mut saw_message = false;
        let mut saw_complete = false;
        while let Ok(ev) = rx.try_recv() {
            match ev.payload {
                EventPayload::Message { .. } => saw_message = true,
                EventPayload::Complete => saw_complete = true,
                _ => {}
            }
        }
        assert!(saw_message);
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn repeated_identical_turn_hits_the_cache_instead_of_the_provider() {
        let provider = Arc::new(FixedProvider { calls: AtomicUsize::new(0) });
        let cache = Arc::new(cache_store());
        let orchestrator = Orchestrator::new(
            cache,
            provider.clone(),
            Arc::new(PromptBuilder::new()),
            OrchestratorConfig::default(),
        );

        let intent = Intent {
            intent_type: IntentType::Hotels,
            confidence: 0.9,
            entities: HashMap::new(),
            required_action: None,
        };
        let ctx = SessionContext::default();
        let user = test_user();

        let (tx1, _rx1) = mpsc::channel(64);
        orchestrator.run(&intent, &ctx, &user, "city-lisbon", "Lisbon", tx1).await;
        let calls_after_first = provider.calls.load(Ordering::SeqCst);

        let (tx2, _rx2) = mpsc::channel(64);
        orchestrator.run(&intent, &ctx, &user, "city-lisbon", "Lisbon", tx2).await;
        let calls_after_second = provider.calls.load(Ordering::SeqCst);

        assert_eq!(calls_after_first, calls_after_second, "second identical turn should be served from cache");
    }

    /// `run` never closes the channel itself — it only ever holds `Sender`
    /// clones that drop when their owning tasks finish. Closing happens
    /// exactly once, by ownership, however many workers raced to finish
    /// last; reading a closed channel repeatedly is always safe (`None`,
    /// never a panic), which is what "double-close safety" comes down to
    /// once there is no explicit close call to race against.
    #[tokio::test]
    async fn channel_closes_once_after_every_worker_drops_its_sender() {
        let orchestrator = Orchestrator::new(
            Arc::new(cache_store()),
            Arc::new(FixedProvider { calls: AtomicUsize::new(0) }),
            Arc::new(PromptBuilder::new()),
            OrchestratorConfig::default(),
        );

        let intent = Intent {
            intent_type: IntentType::Itinerary,
            confidence: 0.95,
            entities: HashMap::new(),
            required_action: None,
        };
        let (tx, mut rx) = mpsc::channel(64);
        orchestrator
            .run(&intent, &SessionContext::default(), &test_user(), "city-lisbon", "Lisbon", tx)
            .await;

        while rx.recv().await.is_some() {}
        assert!(rx.recv().await.is_none());
        assert!(rx.recv().await.is_none(), "reading a closed channel twice must stay safe");
    }
}
