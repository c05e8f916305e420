//! Configuration for the store client and the sync engine.
//!
//! Endpoints and keys are opaque, externally injected values; nothing here
//! is discovered at runtime.

use std::time::Duration;

use thiserror::Error;

/// A required environment variable was absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing environment variable: {0}")]
pub struct MissingConfig(pub &'static str);

/// Connection settings for the hosted document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the REST surface, e.g. `https://host/rest/v1`.
    pub rest_url: String,
    /// Base URL of the realtime websocket surface, e.g. `wss://host/realtime/v1`.
    pub realtime_url: String,
    /// Project API key, sent with every request.
    pub api_key: String,
    /// Per-user access token; the API key is used as the bearer when absent.
    pub access_token: Option<String>,
}

impl StoreConfig {
    pub fn new(
        rest_url: impl Into<String>,
        realtime_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            rest_url: rest_url.into(),
            realtime_url: realtime_url.into(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Read from `SYNCPAD_STORE_URL`, `SYNCPAD_REALTIME_URL`,
    /// `SYNCPAD_STORE_KEY` and optional `SYNCPAD_STORE_TOKEN`.
    pub fn from_env() -> Result<Self, MissingConfig> {
        let var = |name: &'static str| std::env::var(name).map_err(|_| MissingConfig(name));
        Ok(Self {
            rest_url: var("SYNCPAD_STORE_URL")?,
            realtime_url: var("SYNCPAD_REALTIME_URL")?,
            api_key: var("SYNCPAD_STORE_KEY")?,
            access_token: std::env::var("SYNCPAD_STORE_TOKEN").ok(),
        })
    }
}

/// Tunables for one open document's sync engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet interval after the last keystroke before the accumulated
    /// content is persisted.
    pub debounce: Duration,
    /// Capacity of the engine's outbound event channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Create config for testing (short quiet interval).
    pub fn for_testing() -> Self {
        Self {
            debounce: Duration::from_millis(25),
            event_capacity: 64,
        }
    }
}
