use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{instrument, warn};

use travel_cache::CacheStore;
use travel_llm::{ChatRequest, LlmProvider, Message as LlmMessage, Role, StreamEvent as LlmStreamEvent};
use travel_prompt::PartPrompt;
use travel_protocol::{EventPayload, StreamEvent};

use crate::shared::SharedState;
use crate::terminal_event::payload_for_part;

pub struct WorkerConfig {
    pub model: String,
    pub max_tokens: u32,
    pub deterministic_ttl_secs: u64,
    pub personalized_ttl_secs: u64,
    pub send_event_timeout: Duration,
}

/// Only `personalized_poi` varies by caller profile today; every other
/// part is safe to share across callers under the deterministic TTL.
fn ttl_for_part(part_type: &str, cfg: &WorkerConfig) -> u64 {
    if part_type == "personalized_poi" {
        cfg.personalized_ttl_secs
    } else {
        cfg.deterministic_ttl_secs
    }
}

/// What a worker leaves behind for the completion task: whether it
/// produced output, so the completion task can decide between a normal
/// `navigation`/`complete` pair and an all-failed top-level error.
pub struct WorkerOutcome {
    pub part_type: String,
    pub succeeded: bool,
}

/// Runs one fan-out worker for a single part.
///
/// Computes the part's cache fingerprint, joins the single-flight producer
/// for it (issuing the LLM call only if no one else is already producing
/// this fingerprint), forwards token deltas as `chunk` events as they
/// arrive, and on completion emits the part's terminal typed event itself
/// — it does not wait for sibling workers.
#[instrument(skip_all, fields(part_type = %prompt.part_type))]
pub async fn run_worker(
    prompt: PartPrompt,
    user_profile_fingerprint: String,
    city_id: String,
    cache: Arc<CacheStore>,
    provider: Arc<dyn LlmProvider>,
    shared: Arc<SharedState>,
    cfg: Arc<WorkerConfig>,
    out_tx: mpsc::Sender<StreamEvent>,
    next_event_id: Arc<AtomicU64>,
) -> WorkerOutcome {
    let part_type = prompt.part_type.clone();

    let fingerprint = travel_cache::compute_fingerprint(
        &prompt.template_id,
        &user_profile_fingerprint,
        &city_id,
        &part_type,
        &cfg.model,
    );
    shared.record_cache_key(&part_type, &fingerprint);

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<String>(32);

    let forward_part_type = part_type.clone();
    let forward_out_tx = out_tx.clone();
    let forward_event_id = next_event_id.clone();
    let forward_timeout = cfg.send_event_timeout;
    let forward_task = tokio::spawn(async move {
        while let Some(delta) = chunk_rx.recv().await {
            let event = StreamEvent::new(
                forward_event_id.fetch_add(1, Ordering::SeqCst),
                EventPayload::Chunk {
                    part_type: forward_part_type.clone(),
                    content: delta,
                },
            );
            if tokio::time::timeout(forward_timeout, forward_out_tx.send(event))
                .await
                .is_err()
            {
                // consumer gone or too slow; stop forwarding, let the
                // producer finish on its own so the cache still commits.
                break;
            }
        }
    });

    let producer_provider = provider.clone();
    let producer_model = cfg.model.clone();
    let producer_max_tokens = cfg.max_tokens;
    let producer_system = prompt.system.clone();
    let producer_message = prompt.user_message.clone();
    let producer_chunk_tx = chunk_tx.clone();
    drop(chunk_tx);

    let producer = move || async move {
        let req = ChatRequest {
            model: producer_model,
            system: producer_system,
            messages: vec![LlmMessage {
                role: Role::User,
                content: producer_message,
            }],
            max_tokens: producer_max_tokens,
            stream: true,
        };

        let (llm_tx, mut llm_rx) = mpsc::channel::<LlmStreamEvent>(32);
        let send_fut = producer_provider.send_stream(&req, llm_tx);
        let collect_fut = async {
            let mut content = String::new();
            while let Some(ev) = llm_rx.recv().await {
                match ev {
                    LlmStreamEvent::TextDelta { text } => {
                        content.push_str(&text);
                        let _ = producer_chunk_tx.send(text).await;
                    }
                    LlmStreamEvent::Done { .. } => break,
                    LlmStreamEvent::Error { message } => return Err(message),
                }
            }
            Ok(content)
        };

        let (send_result, collect_result) = tokio::join!(send_fut, collect_fut);
        send_result.map_err(|e| e.to_string())?;
        collect_result
    };

    let ttl_secs = ttl_for_part(&part_type, &cfg);
    let result = cache.get_or_generate(&fingerprint, ttl_secs, producer).await;
    let _ = forward_task.await;

    match result {
        Ok(generation) => {
            shared.record_response(&part_type, &generation.content);
            let payload = payload_for_part(&part_type, &generation.content);
            let event = StreamEvent::new(next_event_id.fetch_add(1, Ordering::SeqCst), payload);
            let _ = tokio::time::timeout(cfg.send_event_timeout, out_tx.send(event)).await;
            WorkerOutcome {
                part_type,
                succeeded: true,
            }
        }
        Err(e) => {
            warn!(part_type = %part_type, err = %e, "worker failed");
            let event = StreamEvent::new(
                next_event_id.fetch_add(1, Ordering::SeqCst),
                EventPayload::Error {
                    part_type: Some(part_type.clone()),
                    code: "unavailable".to_string(),
                    message: e.to_string(),
                },
            );
            let _ = tokio::time::timeout(cfg.send_event_timeout, out_tx.send(event)).await;
            WorkerOutcome {
                part_type,
                succeeded: false,
            }
        }
    }
}
