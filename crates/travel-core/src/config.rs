use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8089;
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Recommended bounded event-channel capacity (§4.1).
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 150;
/// Producer→channel send timeout (§5).
pub const DEFAULT_SEND_EVENT_TIMEOUT_MS: u64 = 2_000;
/// Handler→transport send timeout (§5).
pub const DEFAULT_CONTINUE_EVENT_TIMEOUT_MS: u64 = 3_000;
/// Default per-stream wall clock deadline.
pub const DEFAULT_STREAM_DEADLINE_SECS: u64 = 120;

/// Top-level config (travel.toml + TRAVEL_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelConfig {
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                port: DEFAULT_PORT,
                bind: DEFAULT_BIND.to_string(),
            },
            auth: AuthConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            streaming: StreamingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// JWT signing + TTL configuration (§6 Environment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    pub anthropic: Option<AnthropicConfig>,
    pub openai: Option<OpenAiProviderConfig>,
    pub ollama: Option<OllamaConfig>,
    /// Model id used when a request doesn't pin one explicitly.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Retry budget per provider call (§4.8).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

/// CachedGeneration TTLs (§9 open question decision).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_deterministic_ttl")]
    pub deterministic_ttl_secs: u64,
    #[serde(default)]
    pub personalized_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            deterministic_ttl_secs: default_deterministic_ttl(),
            personalized_ttl_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_per_sec")]
    pub requests_per_sec: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_sec: default_rate_per_sec(),
            burst: default_burst(),
        }
    }
}

/// §5 timeouts and channel sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_channel_capacity")]
    pub event_channel_capacity: usize,
    #[serde(default = "default_send_event_timeout_ms")]
    pub send_event_timeout_ms: u64,
    #[serde(default = "default_continue_event_timeout_ms")]
    pub continue_event_timeout_ms: u64,
    #[serde(default = "default_stream_deadline_secs")]
    pub stream_deadline_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_channel_capacity(),
            send_event_timeout_ms: default_send_event_timeout_ms(),
            continue_event_timeout_ms: default_continue_event_timeout_ms(),
            stream_deadline_secs: default_stream_deadline_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_access_ttl_secs() -> i64 {
    15 * 60
}
fn default_refresh_ttl_secs() -> i64 {
    30 * 24 * 60 * 60
}
fn default_model() -> String {
    "claude-sonnet-4-6".to_string()
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_deterministic_ttl() -> u64 {
    3_600
}
fn default_rate_per_sec() -> u32 {
    5
}
fn default_burst() -> u32 {
    10
}
fn default_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}
fn default_send_event_timeout_ms() -> u64 {
    DEFAULT_SEND_EVENT_TIMEOUT_MS
}
fn default_continue_event_timeout_ms() -> u64 {
    DEFAULT_CONTINUE_EVENT_TIMEOUT_MS
}
fn default_stream_deadline_secs() -> u64 {
    DEFAULT_STREAM_DEADLINE_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.travel/travel.db", home)
}

impl TravelConfig {
    /// Load config from a TOML file with TRAVEL_* env var overrides.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: TravelConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TRAVEL_").split("_"))
            .extract()
            .map_err(|e| crate::error::Error::Internal(format!("config: {e}")))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.travel/travel.toml", home)
}
