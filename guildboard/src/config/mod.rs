//! Configuration management for guildboard
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `GUILDBOARD_` prefix, `__`
//!    for nesting — e.g. `GUILDBOARD_AUTH__STATE_TTL_SECS=600`)
//! 2. `./config.toml` (development)
//! 3. `/etc/guildboard/config.toml` (system config)
//! 4. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [service]
//! name = "guildboard"
//! host = "127.0.0.1"
//! port = 8080
//! frontend_complete_url = "https://dashboard.example/auth/complete"
//! frontend_error_url = "https://dashboard.example/auth/error"
//!
//! [store]
//! url = "redis://127.0.0.1:6379"
//! op_timeout_ms = 2000
//!
//! [auth]
//! state_ttl_secs = 600
//! session_ttl_secs = 300
//! token_bytes = 32
//!
//! [provider]
//! client_id = "…"
//! client_secret = "…"
//! authorize_url = "https://platform.example/oauth2/authorize"
//! token_url = "https://platform.example/api/oauth2/token"
//! identity_url = "https://platform.example/api/users/@me"
//! redirect_uri = "https://dashboard.example/auth/callback"
//! scopes = ["identify", "guilds"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name used in logs and tracing.
    pub name: String,

    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Frontend URL the browser is redirected to after a successful
    /// callback, carrying only the opaque session handle.
    pub frontend_complete_url: String,

    /// Frontend URL the browser is redirected to on any authentication
    /// failure. Generic by design; the URL never encodes the failure kind.
    pub frontend_error_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "guildboard".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            frontend_complete_url: "http://localhost:5173/auth/complete".to_string(),
            frontend_error_url: "http://localhost:5173/auth/error".to_string(),
        }
    }
}

/// Coordination store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Redis connection URL.
    pub url: String,

    /// Per-operation timeout in milliseconds. A timed-out operation is
    /// treated as a store outage, never as an absent key.
    pub op_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            op_timeout_ms: 2000,
        }
    }
}

impl StoreSettings {
    /// Per-operation timeout as a [`Duration`].
    #[must_use]
    pub const fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Single-use token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// CSRF state token time-to-live in seconds.
    pub state_ttl_secs: u64,

    /// Session exchange handle time-to-live in seconds.
    pub session_ttl_secs: u64,

    /// Random bytes per opaque token (32 bytes = 256 bits).
    pub token_bytes: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            state_ttl_secs: 600,
            session_ttl_secs: 300,
            token_bytes: 32,
        }
    }
}

impl AuthSettings {
    /// State token TTL as a [`Duration`].
    #[must_use]
    pub const fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }

    /// Session exchange handle TTL as a [`Duration`].
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Third-party platform OAuth provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Authorization endpoint the browser is redirected to.
    pub authorize_url: String,

    /// Token endpoint for the authorization-code exchange.
    pub token_url: String,

    /// Identity endpoint queried with the provider access token.
    pub identity_url: String,

    /// Redirect URI registered with the provider (our callback endpoint).
    pub redirect_uri: String,

    /// Requested OAuth scopes.
    pub scopes: Vec<String>,

    /// Timeout for provider HTTP calls in milliseconds.
    pub http_timeout_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorize_url: "https://platform.example/oauth2/authorize".to_string(),
            token_url: "https://platform.example/api/oauth2/token".to_string(),
            identity_url: "https://platform.example/api/users/@me".to_string(),
            redirect_uri: "http://127.0.0.1:8080/auth/callback".to_string(),
            scopes: vec!["identify".to_string()],
            http_timeout_ms: 10_000,
        }
    }
}

impl ProviderSettings {
    /// Provider HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Complete guildboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuildboardConfig {
    /// HTTP service settings.
    #[serde(default)]
    pub service: ServiceSettings,

    /// Coordination store settings.
    #[serde(default)]
    pub store: StoreSettings,

    /// Single-use token settings.
    #[serde(default)]
    pub auth: AuthSettings,

    /// OAuth provider settings.
    #[serde(default)]
    pub provider: ProviderSettings,
}

impl GuildboardConfig {
    /// Load configuration with the documented precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be parsed or merged
    /// values fail type conversion.
    pub fn load() -> anyhow::Result<Self> {
        let mut figment =
            Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?));

        let system_config = PathBuf::from("/etc/guildboard/config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        let config = figment
            .merge(Env::prefixed("GUILDBOARD_").split("__").lowercase(true))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file, with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or merged
    /// values fail type conversion.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GUILDBOARD_").split("__").lowercase(true))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttls_match_security_posture() {
        let config = GuildboardConfig::default();
        assert_eq!(config.auth.state_ttl(), Duration::from_secs(600));
        assert_eq!(config.auth.session_ttl(), Duration::from_secs(300));
        assert_eq!(config.auth.token_bytes, 32);
    }

    #[test]
    fn default_store_settings() {
        let store = StoreSettings::default();
        assert_eq!(store.url, "redis://127.0.0.1:6379");
        assert_eq!(store.op_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn load_from_nonexistent_file_yields_defaults() {
        let config = GuildboardConfig::load_from("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.auth.state_ttl_secs, 600);
    }

    #[test]
    fn load_from_file_overrides_defaults() {
        use std::io::Write;

        let config_path = std::env::temp_dir().join("guildboard_test_config.toml");
        let toml_content = r"
[service]
port = 9090

[auth]
state_ttl_secs = 120
";
        let mut file = std::fs::File::create(&config_path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = GuildboardConfig::load_from(&config_path).unwrap();
        assert_eq!(config.service.port, 9090);
        assert_eq!(config.auth.state_ttl(), Duration::from_secs(120));

        // Untouched sections keep their defaults.
        assert_eq!(config.store.url, "redis://127.0.0.1:6379");
        assert_eq!(config.auth.session_ttl_secs, 300);

        std::fs::remove_file(&config_path).ok();
    }

    #[test]
    fn defaults_serialize_to_toml() {
        // load() seeds figment from the serialized defaults; that round trip
        // must never fail.
        let toml = toml::to_string(&GuildboardConfig::default()).unwrap();
        assert!(toml.contains("state_ttl_secs"));
    }
}
