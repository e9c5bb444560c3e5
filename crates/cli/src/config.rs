use client::DEFAULT_BASE_URL;
use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_TICK_MS: u64 = 100;
const MIN_TICK_MS: u64 = 16;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Terminal UI settings.
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Root URL of the chat backend, without a trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    /// Spinner/redraw interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let cwd = std::env::current_dir().ok()?.join("pxchat.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home_config = Self::home_dir()?.join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("PXCHAT_BACKEND_URL") {
            config.backend.base_url = url;
        }
        if let Ok(tick) = std::env::var("PXCHAT_TICK_MS") {
            config.ui.tick_ms = tick.parse().map_err(|_| ConfigError::InvalidValue {
                field: "ui.tick_ms".to_string(),
                reason: format!("'{tick}' is not a whole number of milliseconds"),
            })?;
        }

        config.validate()?;
        debug!(
            base_url = %config.backend.base_url,
            tick_ms = config.ui.tick_ms,
            "Config loaded"
        );
        Ok(config)
    }

    /// `~/.pxchat`, or `None` without a `HOME`.
    pub fn home_dir() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".pxchat"))
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        let url = self.backend.base_url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url".to_string(),
                reason: format!("'{url}' must start with http:// or https://"),
            });
        }
        self.backend.base_url = url.to_string();
        self.ui.tick_ms = self.ui.tick_ms.max(MIN_TICK_MS);
        Ok(())
    }
}
