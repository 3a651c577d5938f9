//! Console configuration loading: game service endpoint, credentials and polling cadence.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the console looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/console.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BINGO_CONSOLE_CONFIG_PATH";
const BASE_URL_ENV: &str = "BINGO_API_BASE_URL";
const API_KEY_ENV: &str = "BINGO_API_KEY";
const PORT_ENV: &str = "PORT";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_HISTORY_CAPACITY: usize = 5;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PORT: u16 = 7070;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the console.
pub struct ConsoleConfig {
    /// Root URL of the game service; share links are built from it too.
    pub base_url: String,
    /// Operator API key sent with every request.
    pub api_key: Option<String>,
    /// Refresh cadence of the poller.
    pub poll_interval_ms: u64,
    /// Number of call/action entries kept in the history.
    pub history_capacity: usize,
    /// Upper bound for one game service request.
    pub request_timeout_ms: u64,
    /// Port of the local operator API.
    pub port: u16,
    /// Game selected when the console boots.
    pub last_selected_game_id: Option<String>,
}

impl ConsoleConfig {
    /// Load the configuration from disk, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file();
        config.apply_env_overrides();
        config
    }

    fn from_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        base_url = %config.base_url,
                        "loaded console config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(base_url) = non_empty_env(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(api_key) = non_empty_env(API_KEY_ENV) {
            self.api_key = Some(api_key);
        }
        if let Some(port) = non_empty_env(PORT_ENV) {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(err) => warn!(value = %port, error = %err, "ignoring invalid PORT override"),
            }
        }
    }

    /// Refresh cadence as a [`Duration`], never shorter than one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            port: DEFAULT_PORT,
            last_selected_game_id: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    history_capacity: Option<usize>,
    #[serde(default)]
    request_timeout_ms: Option<u64>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    last_selected_game_id: Option<String>,
}

impl From<RawConfig> for ConsoleConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: value
                .base_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.base_url),
            api_key: value.api_key.filter(|key| !key.is_empty()),
            poll_interval_ms: value.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            history_capacity: value
                .history_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.history_capacity),
            request_timeout_ms: value
                .request_timeout_ms
                .unwrap_or(defaults.request_timeout_ms),
            port: value.port.unwrap_or(defaults.port),
            last_selected_game_id: value.last_selected_game_id.filter(|id| !id.is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
