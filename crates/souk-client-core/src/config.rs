//! Client configuration.
//!
//! Configuration is stored as JSON at `$SOUK_CONFIG` or the conventional
//! platform config path; a missing file yields the defaults, so the client
//! works out of the box against the production base URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Production API base URL used when no configuration is present.
pub const DEFAULT_BASE_URL: &str = "https://api.souk.app";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SOUK_CONFIG";

const DEFAULT_HEALTH_PATH: &str = "/health";
const DEFAULT_OTP_PROBE_PATH: &str = "/otp/request";
const DEFAULT_PROFILE_PATH: &str = "/me";
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for the client core: API endpoints, probe budgets and the
/// storage location override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL, no trailing slash.
    pub base_url: String,
    /// Liveness probe path.
    pub health_path: String,
    /// Write-path probe path (representative mutating endpoint).
    pub otp_probe_path: String,
    /// Profile endpoint path.
    pub profile_path: String,
    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Background connectivity check interval in seconds.
    pub check_interval_secs: u64,
    /// Override for the credential storage directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            otp_probe_path: DEFAULT_OTP_PROBE_PATH.to_string(),
            profile_path: DEFAULT_PROFILE_PATH.to_string(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load from `$SOUK_CONFIG` or the platform config path, falling back
    /// to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;
        config.base_url = normalize_base_url(&config.base_url)?;
        Ok(config)
    }

    /// Timeout applied to each individual probe request.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Interval between background connectivity checks.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Directory credentials and preferences are stored under.
    pub fn data_path(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("souk")
    }
}

/// Trim whitespace and a trailing slash from a base URL.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("souk")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_production() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.check_interval(), Duration::from_secs(30));
    }

    #[test]
    fn normalize_base_url_trims_and_drops_trailing_slash() {
        let normalized = normalize_base_url(" https://api.souk.app/ ").unwrap();
        assert_eq!(normalized, "https://api.souk.app");
        assert!(normalize_base_url("   ").is_err());
    }

    #[test]
    fn load_from_parses_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://localhost:8080/"}"#).unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.health_path, "/health");
    }
}
