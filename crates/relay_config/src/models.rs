// --- File: crates/relay_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8086
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

// --- Outbound HTTP Client Config ---
// The upstream timeout is an explicit knob rather than whatever reqwest
// defaults to. One pooled client per integration router is built from this.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpClientConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        HttpClientConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

// --- Redis Cache Config ---
// Holds non-secret connection defaults. The password is never configured
// here; it arrives per request (body/header) or via REDIS_PASSWORD.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RedisConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db: Option<i64>,
}

// --- Anthropic Config ---
// Non-secret defaults only. API key loaded per request or from env var:
// ANTHROPIC_API_KEY
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AnthropicConfig {
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub default_max_tokens: Option<u32>,
}

// --- Stripe Config ---
// Secret key loaded per request or from env var: STRIPE_SECRET_KEY.
// Webhook signing secret from env var: STRIPE_WEBHOOK_SECRET.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StripeConfig {
    pub base_url: Option<String>,
    /// Maximum accepted age of a webhook timestamp, in seconds.
    pub webhook_tolerance_secs: Option<i64>,
}

// --- TikTok Config ---
// Access token loaded per request or from env var: TIKTOK_ACCESS_TOKEN
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TikTokConfig {
    pub base_url: Option<String>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http_client: HttpClientConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_redis: bool,
    #[serde(default)]
    pub use_anthropic: bool,
    #[serde(default)]
    pub use_stripe: bool,
    #[serde(default)]
    pub use_tiktok: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub anthropic: Option<AnthropicConfig>,
    #[serde(default)]
    pub stripe: Option<StripeConfig>,
    #[serde(default)]
    pub tiktok: Option<TikTokConfig>,
}
