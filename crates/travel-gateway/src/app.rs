use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use governor::{Quota, RateLimiter};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::clock::DefaultClock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use travel_cache::CacheStore;
use travel_collab::InMemoryCollaborators;
use travel_core::TravelConfig;
use travel_intent::IntentClassifier;
use travel_llm::{HealthTracker, LlmProvider};
use travel_orchestrator::Orchestrator;
use travel_prompt::PromptBuilder;
use travel_sessions::SessionStore;
use travel_users::UserStore;

/// Per-`(identity, procedure)` token bucket (§4.2 step 4).
pub type KeyedRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Central shared state — passed as Arc<AppState> to every Axum handler.
pub struct AppState {
    pub config: TravelConfig,
    pub users: UserStore,
    pub sessions: SessionStore,
    pub cache: Arc<CacheStore>,
    pub provider: Arc<dyn LlmProvider>,
    pub health: Arc<HealthTracker>,
    pub classifier: IntentClassifier,
    pub prompt_builder: Arc<PromptBuilder>,
    pub collab: Arc<InMemoryCollaborators>,
    pub orchestrator: Arc<Orchestrator>,
    pub rate_limiter: Arc<KeyedRateLimiter>,
}

impl AppState {
    pub fn new(
        config: TravelConfig,
        users: UserStore,
        sessions: SessionStore,
        cache: Arc<CacheStore>,
        provider: Arc<dyn LlmProvider>,
        health: Arc<HealthTracker>,
        collab: Arc<InMemoryCollaborators>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        let quota = Quota::per_second(
            std::num::NonZeroU32::new(config.rate_limit.requests_per_sec.max(1)).unwrap(),
        )
        .allow_burst(std::num::NonZeroU32::new(config.rate_limit.burst.max(1)).unwrap());

        Self {
            config,
            users,
            sessions,
            cache,
            provider,
            health,
            classifier: IntentClassifier::new(),
            prompt_builder: Arc::new(PromptBuilder::new()),
            collab,
            orchestrator,
            rate_limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }
}

/// Assemble the full Axum router. Both unary JSON routes and the SSE
/// streaming route are mounted on this one router and pass through the
/// same `tower` layer stack, which is what gives the interceptor chain
/// (§4.2) its unary/streaming parity.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(crate::http::auth::register))
        .route("/auth/login", post(crate::http::auth::login))
        .route("/auth/refresh", post(crate::http::auth::refresh_token))
        .route("/auth/validate", post(crate::http::auth::validate_session))
        .route("/auth/logout", post(crate::http::auth::logout))
        .route("/chat/start", post(crate::http::chat::start_chat))
        .route("/chat/stream", post(crate::http::chat::stream_chat))
        .route("/discover/page", get(crate::http::discover::discover_page))
        .route("/discover/trending", get(crate::http::discover::trending))
        .route("/discover/featured", get(crate::http::discover::featured))
        .route("/discover/recent", get(crate::http::discover::recent_discoveries))
        .route("/discover/category", get(crate::http::discover::category_results))
        .route("/profile/{profile_id}", get(crate::http::profile::get_user_profile_by_id))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_layer,
        ))
        .route("/health", get(crate::http::health::health_handler))
        .route("/health/details", get(crate::http::health::health_details_handler))
        .route("/ready", get(crate::http::health::ready_handler))
        .route("/metrics", get(crate::http::health::metrics_handler))
        .with_state(state.clone())
        // Layers stack outermost-last: the call order below makes recovery
        // innermost (right before the router/auth) and request-id outermost
        // (first to see the request), matching the interceptor order of
        // request-id -> tracing -> rate-limit -> recovery -> router(auth).
        .layer(tower_http::catch_panic::CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_id::request_id_layer))
        .layer(CorsLayer::permissive())
}
