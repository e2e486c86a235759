//! Configuration management for SIWARAS
//!
//! Configuration is static: a missing file simply means the built-in
//! defaults. Command-line flags and environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::client::BaseUrls;
use crate::client::gateway::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{ConfigError, Result};
use crate::storage::DEFAULT_QUOTA_BYTES;

pub const DEFAULT_WISUDA_URL: &str = "https://script.google.com/macros/s/AKfycbytZC6Gj66tyUhoBtoDo5Oyv8wD0U7sSK7_livodcMQhwqV0epaUol_rMLs6ixc8x0/exec";
pub const DEFAULT_SOSPROM_URL: &str = "https://script.google.com/macros/s/AKfycbw7n02rBDkpEPIli-eJeVXs6hMsSd57-o0AV1te4bljMlNK-rO8egNVY4-5Mxv4RchA-A/exec";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend for the graduation inventory
    pub wisuda_url: String,

    /// Backend for the promotional inventory
    pub sosprom_url: String,

    /// How long a cached read stays valid
    pub cache_ttl_secs: u64,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Size limit of the session store
    pub storage_quota_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wisuda_url: DEFAULT_WISUDA_URL.to_string(),
            sosprom_url: DEFAULT_SOSPROM_URL.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".siwaras").join("config.yaml"))
    }

    /// Resolve an optional override to a concrete path
    pub fn path_or_default(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load from `path` (or the default path); defaults when no file exists
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::path_or_default(path)?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, contents)?;

        Ok(())
    }

    /// Reject values that would make every request fail
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("wisuda_url", &self.wisuda_url), ("sosprom_url", &self.sosprom_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(
                    ConfigError::Invalid(format!("{} must be an http(s) URL: {}", name, url))
                        .into(),
                );
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".to_string()).into());
        }
        Ok(())
    }

    pub fn base_urls(&self) -> BaseUrls {
        BaseUrls {
            wisuda: self.wisuda_url.clone(),
            sosprom: self.sosprom_url.clone(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache_ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.storage_quota_bytes, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let config = Config::load_at(path.to_str()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config {
            wisuda_url: "http://localhost:8080/wisuda".to_string(),
            cache_ttl_secs: 60,
            ..Config::default()
        };
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.base_urls().wisuda, "http://localhost:8080/wisuda");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "cache_ttl_secs: 10\n").unwrap();

        let config = Config::load_from(path).unwrap();
        assert_eq!(config.cache_ttl_secs, 10);
        assert_eq!(config.sosprom_url, DEFAULT_SOSPROM_URL);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = Config {
            sosprom_url: "ftp://nope".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "cache_ttl_secs: [not a number").unwrap();

        assert!(matches!(
            Config::load_from(path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }
}
