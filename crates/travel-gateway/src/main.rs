use std::net::SocketAddr;
use std::sync::Arc;

use rusqlite::Connection;
use tracing::info;

use travel_cache::CacheStore;
use travel_collab::InMemoryCollaborators;
use travel_core::TravelConfig;
use travel_llm::{
    AnthropicProvider, HealthTracker, HealthTrackingProvider, LlmProvider, OllamaProvider,
    OpenAiProvider, ProviderRouter, ProviderSlot,
};
use travel_orchestrator::{Orchestrator, OrchestratorConfig};
use travel_prompt::PromptBuilder;
use travel_sessions::SessionStore;
use travel_users::{TokenIssuer, UserStore};

use travel_gateway::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_gateway=info,tower_http=debug".into()),
        )
        .init();

    let config_path = std::env::var("TRAVEL_CONFIG").ok();
    let config = TravelConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({e}), using defaults");
        TravelConfig::default()
    });

    std::fs::create_dir_all(
        std::path::Path::new(&config.database.path)
            .parent()
            .unwrap_or_else(|| std::path::Path::new(".")),
    )?;

    let users_conn = Connection::open(&config.database.path)?;
    travel_users::db::init_db(&users_conn)?;
    let tokens = TokenIssuer::new(
        config.auth.jwt_secret.clone(),
        config.auth.access_ttl_secs,
        config.auth.refresh_ttl_secs,
    );
    let users = UserStore::new(users_conn, tokens);

    let sessions_conn = Connection::open(&config.database.path)?;
    travel_sessions::db::init_db(&sessions_conn)?;
    let sessions = SessionStore::new(sessions_conn);

    let cache_conn = Connection::open(&config.database.path)?;
    travel_cache::db::init_db(&cache_conn)?;
    let cache = Arc::new(CacheStore::new(cache_conn));

    let health = HealthTracker::new();
    let provider = Arc::new(build_provider_router(&config, health.clone())) as Arc<dyn LlmProvider>;

    let collab = Arc::new(InMemoryCollaborators::new());
    let prompt_builder = Arc::new(PromptBuilder::new());

    let orchestrator = Arc::new(Orchestrator::new(
        cache.clone(),
        provider.clone(),
        prompt_builder.clone(),
        OrchestratorConfig {
            model: config.llm.default_model.clone(),
            max_tokens: 1024,
            deterministic_ttl_secs: config.cache.deterministic_ttl_secs,
            personalized_ttl_secs: config.cache.personalized_ttl_secs,
            send_event_timeout: std::time::Duration::from_millis(config.streaming.send_event_timeout_ms),
        },
    ));

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let state = Arc::new(app::AppState::new(
        config, users, sessions, cache, provider, health, collab, orchestrator,
    ));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("travel gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Every configured provider becomes one failover slot, wrapped so its
/// real-traffic outcomes feed the shared [`HealthTracker`]. Order matches
/// the config file: anthropic, then openai, then ollama.
fn build_provider_router(config: &TravelConfig, health: Arc<HealthTracker>) -> ProviderRouter {
    let mut slots = Vec::new();

    if let Some(anthropic) = &config.llm.anthropic {
        let tracked = HealthTrackingProvider::new(
            Box::new(AnthropicProvider::new(
                anthropic.api_key.clone(),
                Some(anthropic.base_url.clone()),
            )),
            health.clone(),
        );
        slots.push(ProviderSlot::new(Box::new(tracked), config.llm.retry_attempts));
    }

    if let Some(openai) = &config.llm.openai {
        let tracked = HealthTrackingProvider::new(
            Box::new(OpenAiProvider::new(openai.api_key.clone(), Some(openai.base_url.clone()))),
            health.clone(),
        );
        slots.push(ProviderSlot::new(Box::new(tracked), config.llm.retry_attempts));
    }

    if let Some(ollama) = &config.llm.ollama {
        let tracked = HealthTrackingProvider::new(
            Box::new(OllamaProvider::new(Some(ollama.base_url.clone()))),
            health.clone(),
        );
        slots.push(ProviderSlot::new(Box::new(tracked), config.llm.retry_attempts));
    }

    if slots.is_empty() {
        tracing::warn!("no LLM provider configured, falling back to a local Ollama default");
        let tracked = HealthTrackingProvider::new(Box::new(OllamaProvider::new(None)), health);
        slots.push(ProviderSlot::new(Box::new(tracked), config.llm.retry_attempts));
    }

    ProviderRouter::new(slots)
}
