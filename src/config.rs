//! Application-level configuration loading: cache and reconciliation timings,
//! grant bounds and storage backend selection.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BOOSTERS_BACK_CONFIG_PATH";
const THIRTY_DAYS_MILLIS: i64 = 30 * 24 * 60 * 60 * 1_000;

/// Persistence backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// MongoDB, reached through the mongodb driver.
    #[default]
    Mongo,
    /// Process-local store, lost on restart.
    Memory,
}

/// Storage supervisor settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend connected at startup.
    pub backend: StorageBackend,
    /// Seconds between health checks once connected.
    pub health_poll_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            health_poll_secs: 5,
        }
    }
}

impl StorageConfig {
    /// Health check period, at least one second.
    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_secs.max(1))
    }
}

/// Immutable runtime configuration shared across the application.
///
/// Every field is optional in the JSON file; missing ones keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds between reconciliation runs.
    pub reconcile_interval_secs: u64,
    /// Seconds a cached player listing stays fresh.
    pub cache_ttl_secs: u64,
    /// Milliseconds before a listing load triggers the slow-load notice.
    pub slow_load_notice_ms: u64,
    /// Smallest multiplier accepted by grants.
    pub min_multiplier: u8,
    /// Largest multiplier accepted by grants.
    pub max_multiplier: u8,
    /// Longest activation window accepted by grants.
    pub max_duration_millis: i64,
    /// Storage backend and supervision.
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: 30,
            cache_ttl_secs: 30,
            slow_load_notice_ms: 250,
            min_multiplier: 2,
            max_multiplier: 100,
            max_duration_millis: THIRTY_DAYS_MILLIS,
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        backend = ?config.storage.backend,
                        reconcile_interval_secs = config.reconcile_interval_secs,
                        cache_ttl_secs = config.cache_ttl_secs,
                        "loaded configuration"
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

    /// Parse a JSON document, rejecting bounds that cannot be honoured.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(contents).map_err(|err| err.to_string())?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), String> {
        if self.min_multiplier < 2 {
            return Err(format!(
                "min_multiplier must be at least 2, got {}",
                self.min_multiplier
            ));
        }
        if self.min_multiplier > self.max_multiplier {
            return Err(format!(
                "min_multiplier {} exceeds max_multiplier {}",
                self.min_multiplier, self.max_multiplier
            ));
        }
        if self.max_duration_millis <= 0 {
            return Err("max_duration_millis must be positive".into());
        }
        Ok(())
    }

    /// Period of the reconciliation task, at least one second.
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }

    /// Freshness window of cached player listings.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Delay after which a pending listing load is reported as slow.
    pub fn slow_load_notice(&self) -> Duration {
        Duration::from_millis(self.slow_load_notice_ms)
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
