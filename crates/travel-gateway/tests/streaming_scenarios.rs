//! End-to-end tests against the assembled router: auth, a fan-out chat
//! turn, and the cache/fan-out guarantees that sit behind it. Each test
//! below is named for the concrete behaviour it exercises rather than any
//! outside numbering scheme.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

use travel_cache::CacheStore;
use travel_collab::{City, InMemoryCollaborators};
use travel_core::TravelConfig;
use travel_gateway::app::{build_router, AppState};
use travel_llm::{ChatRequest, ChatResponse, HealthTracker, LlmProvider, ProviderError};
use travel_orchestrator::{Orchestrator, OrchestratorConfig};
use travel_prompt::PromptBuilder;
use travel_sessions::SessionStore;
use travel_users::{TokenIssuer, UserStore};

/// Always succeeds with a small JSON body; counts invocations so tests can
/// assert on single-flight / fan-out behaviour without a real backend.
struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting-test-provider"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChatResponse {
            content: json!({"ok": true}).to_string(),
            model: req.model.clone(),
            tokens_in: 1,
            tokens_out: 1,
            stop_reason: "stop".to_string(),
        })
    }
}

struct TestEnv {
    state: Arc<AppState>,
    router: Router,
    provider: Arc<CountingProvider>,
}

fn build_env() -> TestEnv {
    let users_conn = Connection::open_in_memory().unwrap();
    travel_users::db::init_db(&users_conn).unwrap();
    let tokens = TokenIssuer::new("test-secret", 900, 2_592_000);
    let users = UserStore::new(users_conn, tokens);

    let sessions_conn = Connection::open_in_memory().unwrap();
    travel_sessions::db::init_db(&sessions_conn).unwrap();
    let sessions = SessionStore::new(sessions_conn);

    let cache_conn = Connection::open_in_memory().unwrap();
    travel_cache::db::init_db(&cache_conn).unwrap();
    let cache = Arc::new(CacheStore::new(cache_conn));

    let health = HealthTracker::new();

    let provider = Arc::new(CountingProvider::new());
    let provider_dyn = provider.clone() as Arc<dyn LlmProvider>;

    let collab = Arc::new(InMemoryCollaborators::new());
    collab.seed_city(City {
        id: "city-lisbon".to_string(),
        name: "Lisbon".to_string(),
        country: "Portugal".to_string(),
        timezone: "Europe/Lisbon".to_string(),
    });

    let orchestrator = Arc::new(Orchestrator::new(
        cache.clone(),
        provider_dyn.clone(),
        Arc::new(PromptBuilder::new()),
        OrchestratorConfig::default(),
    ));

    let state = Arc::new(AppState::new(
        TravelConfig::default(),
        users,
        sessions,
        cache,
        provider_dyn,
        health,
        collab,
        orchestrator,
    ));
    let router = build_router(state.clone());

    TestEnv { state, router, provider }
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_and_login(router: &Router, email: &str) -> String {
    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": email,
                        "display_name": "Test User",
                        "password": "hunter222",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let auth = json_body(res).await;
    auth["access_token"].as_str().unwrap().to_string()
}

async fn start_chat(router: &Router, token: &str, city_name: &str) -> String {
    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat/start")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    json!({"profile_id": "profile-1", "city_name": city_name}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let started = json_body(res).await;
    started["session_id"].as_str().unwrap().to_string()
}

fn stream_request(token: &str, session_id: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat/stream")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(
            json!({"session_id": session_id, "message": message}).to_string(),
        ))
        .unwrap()
}

fn parse_sse_events(body: &[u8]) -> Vec<Value> {
    std::str::from_utf8(body)
        .unwrap()
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

/// Itinerary happy path: `start` .. `domain_detected` .. the three
/// itinerary parts .. `navigation` .. `complete`, with both turns durably
/// recorded on the session.
#[tokio::test]
async fn itinerary_happy_path_streams_expected_event_sequence() {
    let env = build_env();
    let token = register_and_login(&env.router, "ana@example.com").await;
    let session_id = start_chat(&env.router, &token, "Lisbon").await;

    let res = env
        .router
        .clone()
        .oneshot(stream_request(&token, &session_id, "Build me an itinerary in Lisbon"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let events = parse_sse_events(&bytes);
    let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();

    assert_eq!(types.first(), Some(&"start"));
    assert_eq!(types.last(), Some(&"complete"));
    assert!(types.contains(&"domain_detected"));
    assert!(types.contains(&"city_data"));
    assert!(types.contains(&"general_poi"));
    assert!(types.contains(&"itinerary"));
    assert!(types.contains(&"navigation"));
    assert_eq!(types.iter().filter(|t| **t == "complete").count(), 1);

    let transcript = env.state.sessions.list_messages(&session_id).unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "Build me an itinerary in Lisbon");
    assert!(!transcript[1].content.is_empty());
}

/// A stream opened without a bearer token is rejected before any `start`
/// event is sent — the 401 is the entire response body.
#[tokio::test]
async fn streaming_without_a_token_is_rejected_before_any_event() {
    let env = build_env();
    let req = Request::builder()
        .method("POST")
        .uri("/chat/stream")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"session_id": "whatever", "message": "hi"}).to_string(),
        ))
        .unwrap();

    let res = env.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(res).await;
    assert_eq!(body["code"], "unauthenticated");
    assert_eq!(env.provider.calls.load(Ordering::SeqCst), 0);
}

/// Two concurrent requests for the same turn (same user, same city, same
/// message) race for the same cache fingerprint per part; only one of them
/// should reach the provider for each part, and both streams still observe
/// a normal `complete`.
#[tokio::test]
async fn concurrent_identical_turns_single_flight_to_the_provider() {
    let env = build_env();
    let token = register_and_login(&env.router, "bora@example.com").await;
    let session_a = start_chat(&env.router, &token, "Lisbon").await;
    let session_b = start_chat(&env.router, &token, "Lisbon").await;

    let router_a = env.router.clone();
    let router_b = env.router.clone();
    let token_a = token.clone();
    let token_b = token.clone();

    let (res_a, res_b) = tokio::join!(
        router_a.oneshot(stream_request(&token_a, &session_a, "where to eat in Lisbon")),
        router_b.oneshot(stream_request(&token_b, &session_b, "where to eat in Lisbon")),
    );

    let events_a = parse_sse_events(&res_a.unwrap().into_body().collect().await.unwrap().to_bytes());
    let events_b = parse_sse_events(&res_b.unwrap().into_body().collect().await.unwrap().to_bytes());

    for events in [&events_a, &events_b] {
        let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(types.last(), Some(&"complete"));
        assert!(types.contains(&"restaurants"));
    }

    // Restaurants intent needs two parts (city_data, restaurants); both
    // sessions ask the identical question for the identical user, so the
    // fingerprint for each part is shared and the producer runs once.
    assert_eq!(env.provider.calls.load(Ordering::SeqCst), 2);
}

/// A client that drops the response mid-stream still lets every worker for
/// that turn finish: the session is left with the complete assistant turn
/// on disk even though nobody read the `complete` event.
#[tokio::test]
async fn client_disconnect_mid_stream_does_not_lose_the_turn() {
    let env = build_env();
    let token = register_and_login(&env.router, "cass@example.com").await;
    let session_id = start_chat(&env.router, &token, "Lisbon").await;

    let res = env
        .router
        .clone()
        .oneshot(stream_request(&token, &session_id, "Build me an itinerary in Lisbon"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Read only the first frame (the `start` event) and then drop the
    // body — the orchestrator task was already spawned independently of
    // whether anyone keeps reading.
    let mut body = res.into_body();
    let _first_frame = body.frame().await;
    drop(body);

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    loop {
        let transcript = env.state.sessions.list_messages(&session_id).unwrap();
        if transcript.len() == 2 {
            break;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("assistant turn was not persisted after client disconnect");
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}

/// An unknown profile id is a plain `not_found`, not a synthesised default
/// profile (there is no legacy fallback route in this implementation).
#[tokio::test]
async fn unknown_profile_id_is_not_found() {
    let env = build_env();
    let token = register_and_login(&env.router, "dee@example.com").await;

    let res = env
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/profile/does-not-exist")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert_eq!(body["code"], "not_found");
}

/// A worker can fail without sinking the whole turn: `chitchat` has a
/// single `message` part, so forcing that one call to fail should surface
/// the all-failed top-level error rather than a panic or a hang.
#[tokio::test]
async fn all_parts_failing_ends_the_stream_with_a_top_level_error() {
    struct AlwaysFails;

    #[async_trait]
    impl LlmProvider for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        async fn send(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            Err(ProviderError::Unavailable("simulated outage".to_string()))
        }
    }

    let users_conn = Connection::open_in_memory().unwrap();
    travel_users::db::init_db(&users_conn).unwrap();
    let users = UserStore::new(users_conn, TokenIssuer::new("test-secret", 900, 2_592_000));

    let sessions_conn = Connection::open_in_memory().unwrap();
    travel_sessions::db::init_db(&sessions_conn).unwrap();
    let sessions = SessionStore::new(sessions_conn);

    let cache_conn = Connection::open_in_memory().unwrap();
    travel_cache::db::init_db(&cache_conn).unwrap();
    let cache = Arc::new(CacheStore::new(cache_conn));

    let provider: Arc<dyn LlmProvider> = Arc::new(AlwaysFails);
    let collab = Arc::new(InMemoryCollaborators::new());
    let orchestrator = Arc::new(Orchestrator::new(
        cache.clone(),
        provider.clone(),
        Arc::new(PromptBuilder::new()),
        OrchestratorConfig::default(),
    ));
    let state = Arc::new(AppState::new(
        TravelConfig::default(),
        users,
        sessions,
        cache,
        provider,
        HealthTracker::new(),
        collab,
        orchestrator,
    ));
    let router = build_router(state.clone());

    let token = register_and_login(&router, "erin@example.com").await;
    let session_id = start_chat(&router, &token, "Lisbon").await;

    let res = router
        .clone()
        .oneshot(stream_request(&token, &session_id, "hi there"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let events = parse_sse_events(&bytes);
    let last = events.last().unwrap();
    assert_eq!(last["type"], "error");
    assert_eq!(last["code"], "unavailable");
}
