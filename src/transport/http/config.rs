use std::time::Duration;

use crate::config::ConsoleConfig;

/// Runtime configuration describing how to reach the game service.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Service root, e.g. `https://bingo.example.org`.
    pub base_url: String,
    /// Key sent as `X-API-Key` on every call.
    pub api_key: Option<String>,
    /// Upper bound for a single request.
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    /// Construct a configuration for an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Attach the operator's API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl From<&ConsoleConfig> for HttpTransportConfig {
    fn from(config: &ConsoleConfig) -> Self {
        let base = Self::new(config.base_url.clone()).with_timeout(config.request_timeout());
        match config.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => base.with_api_key(key),
            None => base,
        }
    }
}
