//! Configuration management for casebook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "casebook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "posts.db";

/// Prefix for environment overrides, e.g. `CASEBOOK_REMOTE__BASE_URL`.
const ENV_PREFIX: &str = "CASEBOOK_";

/// Shorthand switch for the remote backend.
pub const REMOTE_FLAG_VAR: &str = "CASEBOOK_USE_REMOTE";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. `CASEBOOK_USE_REMOTE`
/// 2. Environment variables (prefixed with `CASEBOOK_`, sections split on `__`)
/// 3. TOML config file at `~/.config/casebook/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local store configuration.
    pub local: LocalConfig,
    /// Remote store configuration.
    pub remote: RemoteConfig,
    /// Fallback and outbox behavior.
    pub sync: SyncConfig,
}

/// Local store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/casebook/posts.db`
    pub database_path: Option<PathBuf>,
    /// Insert the sample posts into a fresh database.
    pub seed_samples: bool,
}

/// Remote store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Route reads and writes through the remote store.
    pub enabled: bool,
    /// Root URL of the document API. Unset leaves the remote store
    /// uninitialized even when enabled.
    pub base_url: Option<String>,
    /// Collection holding the posts.
    pub collection: String,
    /// Bearer token sent with every request.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts at a conditional view increment before giving up.
    pub increment_retries: u32,
}

/// Fallback and outbox configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Replay attempts before a queued remote write is dropped.
    pub max_attempts: u32,
    /// Serve the sample posts when both stores list nothing.
    pub fallback_to_samples: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            seed_samples: true,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            collection: "posts".to_string(),
            api_key: None,
            timeout_secs: 15,
            increment_retries: 3,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            fallback_to_samples: true,
        }
    }
}

impl RemoteConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&[REMOTE_FLAG_VAR])
                    .map(|_| "remote.enabled".into()),
            );

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let remote = &self.remote;

        if remote.collection.is_empty() || remote.collection.contains('/') {
            return Err(Error::ConfigValidation {
                message: format!(
                    "remote.collection must be a single non-empty name, got '{}'",
                    remote.collection
                ),
            });
        }

        if let Some(url) = &remote.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::ConfigValidation {
                    message: format!("remote.base_url must be an http(s) URL, got '{url}'"),
                });
            }
        }

        if remote.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "remote.timeout_secs must be greater than 0".to_string(),
            });
        }

        if remote.increment_retries == 0 {
            return Err(Error::ConfigValidation {
                message: "remote.increment_retries must be greater than 0".to_string(),
            });
        }

        if self.sync.max_attempts == 0 {
            return Err(Error::ConfigValidation {
                message: "sync.max_attempts must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.local
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
