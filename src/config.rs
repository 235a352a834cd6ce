//! Engine configuration.
//!
//! Timing policy (debounce, max delay, freshness TTLs, request timeout) and
//! the remote store URL. Configuration is stored at
//! `~/.config/studydeck-sync/config.json`; a missing file yields defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "studydeck-sync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Debounce delay: quiet time after the last mutation before a flush.
/// 2 seconds absorbs a typing burst into a single write.
const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// Max delay: hard ceiling from the first unflushed mutation to a forced
/// flush, bounding data-loss exposure under continuous editing.
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// How long a successful verification is trusted without re-checking.
const DEFAULT_IDENTITY_TTL_SECS: i64 = 300;

/// How long a loaded document is trusted without reloading.
const DEFAULT_DOCUMENT_TTL_SECS: i64 = 3_600;

/// Wall-clock ceiling on verify/load/save requests.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_api_url() -> String {
    "https://api.studydeck.app".to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_identity_ttl_secs() -> i64 {
    DEFAULT_IDENTITY_TTL_SECS
}

fn default_document_ttl_secs() -> i64 {
    DEFAULT_DOCUMENT_TTL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_identity_ttl_secs")]
    pub identity_ttl_secs: i64,
    #[serde(default = "default_document_ttl_secs")]
    pub document_ttl_secs: i64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            identity_ttl_secs: DEFAULT_IDENTITY_TTL_SECS,
            document_ttl_secs: DEFAULT_DOCUMENT_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn identity_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.identity_ttl_secs)
    }

    pub fn document_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.document_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_debounce_below_max_delay() {
        let config = SyncConfig::default();
        assert!(config.debounce() < config.max_delay());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"api_url":"http://localhost:8787"}"#).unwrap();
        assert_eq!(config.api_url, "http://localhost:8787");
        assert_eq!(config.debounce_ms, 2_000);
    }
}
