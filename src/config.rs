//! Engine configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_HTTP_BASE: &str = "http://localhost:3000/api";
pub const DEFAULT_WS_URL: &str = "ws://localhost:3000/ws";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Endpoints and timing for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Base URL of the session API.
    pub http_base: String,
    /// WebSocket endpoint of the event channel.
    pub ws_url: String,
    /// Fixed delay between reconnect attempts. No backoff, no retry ceiling:
    /// presence stays "eventually live" for as long as the engine runs.
    pub reconnect_delay: Duration,
    /// Per-request timeout for session HTTP calls.
    pub request_timeout: Duration,
    /// Connect timeout for session HTTP calls.
    pub connect_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http_base: DEFAULT_HTTP_BASE.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    /// Config pointing at the given endpoints, with default timing.
    #[must_use]
    pub fn new(http_base: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http_base: http_base.into().trim_end_matches('/').to_string(),
            ws_url: ws_url.into(),
            ..Self::default()
        }
    }

    /// Build engine config from environment variables.
    ///
    /// All optional:
    /// - `COLLAB_HTTP_BASE`: default `http://localhost:3000/api`
    /// - `COLLAB_WS_URL`: default `ws://localhost:3000/ws`
    /// - `COLLAB_RECONNECT_DELAY_MS`: default 3000
    /// - `COLLAB_REQUEST_TIMEOUT_SECS`: default 10
    /// - `COLLAB_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let http_base = std::env::var("COLLAB_HTTP_BASE")
            .unwrap_or_else(|_| DEFAULT_HTTP_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let ws_url = std::env::var("COLLAB_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());

        Self {
            http_base,
            ws_url,
            reconnect_delay: Duration::from_millis(env_parse(
                "COLLAB_RECONNECT_DELAY_MS",
                DEFAULT_RECONNECT_DELAY_MS,
            )),
            request_timeout: Duration::from_secs(env_parse(
                "COLLAB_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(env_parse(
                "COLLAB_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
        }
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
