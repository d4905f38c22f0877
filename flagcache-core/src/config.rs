//! Configuration for the tenant flag cache.
//!
//! The cache runs with sensible defaults; a TOML file can override them:
//!
//! ```toml
//! wait_strategy = "per_key"
//! slow_fetch_threshold_ms = 250
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How callers blocked on another caller's fetch are woken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// One condition variable for the whole table. Every completion wakes
    /// every waiter, and each waiter re-checks its own pair.
    #[default]
    Shared,
    /// One condition variable per in-flight fetch. Only the waiters of the
    /// completed pair are woken.
    PerKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub wait_strategy: WaitStrategy,
    /// Fetches taking at least this long are logged as slow.
    pub slow_fetch_threshold_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            wait_strategy: WaitStrategy::Shared,
            slow_fetch_threshold_ms: 500,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.wait_strategy = strategy;
        self
    }

    /// Set the slow-fetch threshold, rounded down to whole milliseconds and
    /// never below 1 ms.
    pub fn with_slow_fetch_threshold(mut self, threshold: Duration) -> Self {
        self.slow_fetch_threshold_ms = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX).max(1);
        self
    }

    pub fn slow_fetch_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_fetch_threshold_ms)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CacheConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slow_fetch_threshold_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "slow_fetch_threshold_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
