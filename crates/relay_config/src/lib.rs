// --- File: crates/relay_config/src/lib.rs ---

use config::{Config, ConfigError, Environment, File};
use std::sync::Once;

pub mod models;
pub use models::*;

static DOTENV: Once = Once::new();

/// Loads `.env` exactly once per process. Safe to call from anywhere,
/// including tests.
pub fn ensure_dotenv_loaded() {
    DOTENV.call_once(|| {
        dotenv::dotenv().ok();
    });
}

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/default.toml` (optional)
/// 2. `config/{RUN_ENV}.toml` (optional, e.g. `config/production.toml`)
/// 3. Environment variables prefixed `RELAY`, `__` as section separator
///    (e.g. `RELAY__SERVER__PORT=9000`)
///
/// All sections have defaults, so an empty environment still yields a
/// usable config with every integration disabled.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "default".to_string());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_any_source() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8086);
        assert_eq!(config.http_client.timeout_secs, 30);
        assert!(!config.use_redis);
        assert!(config.anthropic.is_none());
    }

    #[test]
    fn feature_sections_deserialize() {
        let raw = r#"{
            "use_anthropic": true,
            "anthropic": { "default_model": "claude-sonnet-4-5" }
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.use_anthropic);
        assert_eq!(
            config.anthropic.unwrap().default_model.as_deref(),
            Some("claude-sonnet-4-5")
        );
    }
}
