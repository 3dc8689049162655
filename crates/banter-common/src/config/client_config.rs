//! Client configuration structs
//!
//! Loads configuration from environment variables, with programmatic
//! construction for embedding.

use serde::Deserialize;
use std::env;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Token used against both the REST and gateway APIs
    pub token: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// REST endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub version: u8,
}

impl ApiConfig {
    /// Versioned base URL for REST calls
    #[must_use]
    pub fn versioned_url(&self) -> String {
        format!("{}/v{}", self.base_url.trim_end_matches('/'), self.version)
    }
}

/// Gateway connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Explicit gateway URL; when unset the REST layer discovers it
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_hello_timeout_ms")]
    pub hello_timeout_ms: u64,
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

/// Entity cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Per-channel message history cap; 0 disables message caching
    #[serde(default = "default_messages_per_channel")]
    pub messages_per_channel: usize,
}

// Default value functions
fn default_api_base_url() -> String {
    "https://discord.com/api".to_string()
}

fn default_api_version() -> u8 {
    10
}

fn default_hello_timeout_ms() -> u64 {
    30_000
}

fn default_reconnect_base_ms() -> u64 {
    1_000
}

fn default_reconnect_max_ms() -> u64 {
    60_000
}

fn default_messages_per_channel() -> usize {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            version: default_api_version(),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: None,
            hello_timeout_ms: default_hello_timeout_ms(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            messages_per_channel: default_messages_per_channel(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with a token and all defaults
    ///
    /// Leading and trailing whitespace is trimmed off the token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_string(),
            api: ApiConfig::default(),
            gateway: GatewaySettings::default(),
            cache: CacheSettings::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            token: env::var("BOT_TOKEN")
                .map(|t| t.trim().to_string())
                .map_err(|_| ConfigError::MissingVar("BOT_TOKEN"))?,
            api: ApiConfig {
                base_url: env::var("API_BASE_URL").unwrap_or_else(|_| default_api_base_url()),
                version: env::var("API_VERSION")
                    .ok()
                    .map(|s| s.parse().map_err(|_| ConfigError::InvalidVar("API_VERSION")))
                    .transpose()?
                    .unwrap_or_else(default_api_version),
            },
            gateway: GatewaySettings {
                url: env::var("GATEWAY_URL").ok(),
                hello_timeout_ms: env::var("GATEWAY_HELLO_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_hello_timeout_ms),
                reconnect_base_ms: env::var("RECONNECT_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_reconnect_base_ms),
                reconnect_max_ms: env::var("RECONNECT_MAX_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_reconnect_max_ms),
            },
            cache: CacheSettings {
                messages_per_channel: env::var("MESSAGE_CACHE_PER_CHANNEL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_messages_per_channel),
            },
        })
    }

    /// Validate fields that cannot be checked while loading
    ///
    /// # Errors
    /// Returns an error if the token is empty after trimming
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingVar("BOT_TOKEN"));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidVar(&'static str),
}
