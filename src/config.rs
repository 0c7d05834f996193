//! Application configuration.
//!
//! Values are layered: built-in defaults, then the JSON file at
//! `~/.config/nutritrack/config.json` (macOS:
//! `~/Library/Application Support/nutritrack/config.json`), then environment
//! variables. The backend URL is the only value without a usable default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "config.json";

pub const ENV_BACKEND_URL: &str = "NUTRITRACK_BACKEND_URL";
/// Fallback name, shared with the web frontend's `.env`.
pub const ENV_BACKEND_URL_FALLBACK: &str = "BACKEND_URL";
pub const ENV_USER_ID: &str = "NUTRITRACK_USER_ID";
pub const ENV_TIMEOUT_SECS: &str = "NUTRITRACK_TIMEOUT_SECS";

/// Stand-in identity until the backend has real accounts.
pub const DEFAULT_USER_ID: &str = "default_user";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("backend URL is not configured (set NUTRITRACK_BACKEND_URL)")]
    MissingBackendUrl,
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub user_id: String,
    pub request_timeout_secs: u64,
    pub camera_timeout_secs: u64,
    /// Window for the food history view.
    pub history_days: u32,
    /// Window for the weight history view.
    pub weight_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            user_id: DEFAULT_USER_ID.to_string(),
            request_timeout_secs: 30,
            camera_timeout_secs: 15,
            history_days: 7,
            weight_days: 30,
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load from an explicit file and environment lookup.
    pub fn load_from(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = path.map(read_file).unwrap_or_default();

        let url = env(ENV_BACKEND_URL)
            .or_else(|| env(ENV_BACKEND_URL_FALLBACK))
            .filter(|u| !u.trim().is_empty());
        if let Some(url) = url {
            config.backend_url = url;
        }
        if let Some(user) = env(ENV_USER_ID).filter(|u| !u.trim().is_empty()) {
            config.user_id = user.trim().to_string();
        }
        if let Some(raw) = env(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: ENV_TIMEOUT_SECS,
                        reason: e.to_string(),
                    })?;
        }

        config.validate()?;
        log::info!(
            "[CONFIG] Backend: {} (user: {})",
            config.backend_url,
            config.user_id
        );
        Ok(config)
    }

    /// Normalize and check the loaded values.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let url = self.backend_url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(ConfigError::MissingBackendUrl);
        }
        let parsed = reqwest::Url::parse(&url).map_err(|e| ConfigError::InvalidBackendUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidBackendUrl {
                url,
                reason: "expected an http(s) URL with a host".to_string(),
            });
        }
        self.backend_url = url;

        if self.user_id.trim().is_empty() {
            self.user_id = DEFAULT_USER_ID.to_string();
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.camera_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "camera_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Persist to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Persist to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[CONFIG] Saved {}", path.display());
        Ok(())
    }
}

/// Path to the config file, if the platform has a config directory.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("nutritrack").join(CONFIG_FILE))
}

/// Missing or unreadable file means defaults.
fn read_file(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("[CONFIG] Ignoring invalid {}: {}", path.display(), e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}
