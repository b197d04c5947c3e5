//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup and treated as immutable for
//! the process lifetime. Handlers and the relay client receive it
//! explicitly; nothing reads the environment after `from_env` returns.

use std::env;
use tracing::warn;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret used to verify webhook signatures
    pub secret: String,

    /// Base URL of the Immich server
    pub immich_url: String,

    /// API key sent with every outbound Immich call
    pub immich_api_key: String,

    /// Album that received assets are added to
    pub album_id: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// HTTP request timeout for outbound Immich calls, in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let config = Config {
            secret: env::var("SECRET").unwrap_or_default(),

            immich_url: env::var("IMMICH_URL").unwrap_or_default(),

            immich_api_key: env::var("IMMICH_API_KEY").unwrap_or_default(),

            album_id: env::var("ALBUM_ID").unwrap_or_default(),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6000),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        };

        if config.secret.is_empty() {
            warn!("SECRET is not set, signed webhooks can never verify");
        }

        config
    }
}
