/// Configuration for the Flowboard client.
/// Reads client.json from ~/.config/flowboard/client.json (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_BASE_URL_ENV: &str = "FLOWBOARD_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Origin of the Socket.IO change-notification server (`ws://host:port`).
    /// Derived from `api_base_url` when unset.
    #[serde(default)]
    pub notify_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:5001/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            notify_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Notification endpoint: the API origin without its `/api` suffix, on
    /// the matching ws/wss scheme.
    pub fn notify_url(&self) -> String {
        if let Some(url) = &self.notify_url {
            return url.clone();
        }
        let base = self.api_base_url.trim_end_matches('/');
        let origin = base.strip_suffix("/api").unwrap_or(base);
        origin
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1)
    }

    /// Apply `FLOWBOARD_API_BASE_URL` when set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        self
    }
}

/// Default config path: ~/.config/flowboard/client.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flowboard")
        .join("client.json")
}

/// Load config from path. Returns defaults if the file is missing or invalid.
pub fn load_config(path: &Path) -> ClientConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(target: "flowboard.config", "Failed to parse config {}: {}", path.display(), e);
            ClientConfig::default()
        }),
        Err(_) => {
            log::info!(target: "flowboard.config", "No config at {}, using defaults", path.display());
            ClientConfig::default()
        }
    }
}
