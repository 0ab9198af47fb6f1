// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User configuration management.
//!
//! Configuration is stored in `$XDG_CONFIG_HOME/feedline/config.toml` and
//! has four sections:
//! - `[server]`: push channel and API endpoints plus credentials
//! - `[connection]`: reconnect budget and notification priorities
//! - `[requests]`: retry and deduplication defaults for the executor
//! - `[offline]`: persistent queue location and tracker timings
//!
//! Every field has a default, so a missing or partial file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fl_core::Priority;

use crate::connection::{ConnectionConfig, Endpoint};
use crate::error::{Error, Result};
use crate::http::ApiClient;
use crate::offline::TrackerConfig;
use crate::request::ExecutorConfig;

const CONFIG_DIR_NAME: &str = "feedline";
const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_FILE_NAME: &str = "queue.jsonl";

/// Environment variable that overrides `server.token`.
pub const TOKEN_ENV: &str = "FEEDLINE_TOKEN";

const REDACTED: &str = "********";

/// Effective configuration for every feedline command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub requests: RequestSettings,
    #[serde(default)]
    pub offline: OfflineSettings,
}

/// Backend endpoints and credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Push channel URL (`ws://` or `wss://`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    /// HTTP API base URL (`http://` or `https://`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Subscription identity sent after every connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Reconnect attempts after an unintended close (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_manual_reconnect_pause_ms")]
    pub manual_reconnect_pause_ms: u64,
    #[serde(default = "default_notification_priorities")]
    pub notification_priorities: Vec<Priority>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            enabled: true,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            manual_reconnect_pause_ms: default_manual_reconnect_pause_ms(),
            notification_priorities: default_notification_priorities(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub deduplicate: bool,
    pub timeout_secs: u64,
}

impl Default for RequestSettings {
    fn default() -> Self {
        RequestSettings {
            max_retries: 3,
            retry_delay_ms: 1000,
            deduplicate: true,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineSettings {
    /// Queue file; defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_path: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub success_banner_ms: u64,
}

impl Default for OfflineSettings {
    fn default() -> Self {
        OfflineSettings {
            queue_path: None,
            poll_interval_secs: 30,
            success_banner_ms: 3000,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_manual_reconnect_pause_ms() -> u64 {
    1000
}

fn default_notification_priorities() -> Vec<Priority> {
    vec![Priority::Critical, Priority::High]
}

impl Config {
    /// Default config file location, `None` when the platform has no config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the config file, applies the environment, and validates.
    ///
    /// `explicit` is the `--config` flag; without it the default path is used.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Config::load(path)?,
            None => match Config::default_path() {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            },
        };
        Ok(config.with_token_override(std::env::var(TOKEN_ENV).ok()))
    }

    /// Replaces `server.token` when `token` is present and non-empty.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.server.token = Some(token);
        }
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Checks URL schemes of the configured endpoints.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.server.ws_url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(Error::InvalidUrl {
                    setting: "server.ws_url",
                    url: url.clone(),
                    expected: "ws:// or wss://",
                });
            }
        }
        if let Some(url) = &self.server.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidUrl {
                    setting: "server.api_url",
                    url: url.clone(),
                    expected: "http:// or https://",
                });
            }
        }
        if self.connection.max_delay_ms < self.connection.base_delay_ms {
            return Err(Error::Config(
                "connection.max_delay_ms must not be less than connection.base_delay_ms"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Connection manager settings. `user` overrides `server.user_id`.
    pub fn connection_config(&self, user: Option<&str>) -> Result<ConnectionConfig> {
        let url = self
            .server
            .ws_url
            .as_deref()
            .ok_or(Error::MissingSetting {
                setting: "server.ws_url",
            })?;

        let mut endpoint = Endpoint::new(url);
        if let Some(token) = &self.server.token {
            endpoint = endpoint.with_token(token);
        }
        if let Some(user) = user.or(self.server.user_id.as_deref()) {
            endpoint = endpoint.with_user(user);
        }

        let settings = &self.connection;
        let mut config = ConnectionConfig::new(endpoint);
        config.enabled = settings.enabled;
        config.max_attempts = settings.max_attempts;
        config.base_delay = Duration::from_millis(settings.base_delay_ms);
        config.max_delay = Duration::from_millis(settings.max_delay_ms);
        config.manual_reconnect_pause = Duration::from_millis(settings.manual_reconnect_pause_ms);
        config.notification_priorities = settings.notification_priorities.iter().copied().collect();
        Ok(config)
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_retries: self.requests.max_retries,
            retry_delay_ms: self.requests.retry_delay_ms,
            deduplicate: self.requests.deduplicate,
            ..ExecutorConfig::default()
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_secs(self.offline.poll_interval_secs),
            success_banner: Duration::from_millis(self.offline.success_banner_ms),
        }
    }

    /// Location of the persistent mutation queue.
    pub fn queue_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.offline.queue_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(QUEUE_FILE_NAME))
            .ok_or(Error::MissingSetting {
                setting: "offline.queue_path",
            })
    }

    /// HTTP client for `server.api_url`.
    pub fn api_client(&self) -> Result<ApiClient> {
        let base_url = self
            .server
            .api_url
            .as_deref()
            .ok_or(Error::MissingSetting {
                setting: "server.api_url",
            })?;
        ApiClient::new(
            base_url,
            self.server.token.clone(),
            Duration::from_secs(self.requests.timeout_secs),
        )
    }

    /// Copy with the token masked, for display.
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        if config.server.token.is_some() {
            config.server.token = Some(REDACTED.to_string());
        }
        config
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
