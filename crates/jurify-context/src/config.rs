use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::StoreError;

/// Maximum number of lead contexts held at once.
pub const DEFAULT_CAPACITY: usize = 10_000;
/// Entries older than this are stale (24 hours).
pub const DEFAULT_TTL_MS: u64 = 24 * 60 * 60 * 1000;
/// Period of the background expiry sweep (1 hour).
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Environment prefix, e.g. `JURIFY_CONTEXT_TTL_MS`.
const ENV_PREFIX: &str = "JURIFY_CONTEXT";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub capacity: usize,
    pub ttl_ms: u64,
    pub cleanup_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_ms: DEFAULT_TTL_MS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }
}

impl StoreConfig {
    /// Load from `JURIFY_CONTEXT_*` environment variables (and `.env`),
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let cfg: StoreConfig = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.capacity == 0 {
            return Err(StoreError::InvalidConfig("capacity must be at least 1".into()));
        }
        if self.ttl_ms == 0 {
            return Err(StoreError::InvalidConfig("ttl_ms must be greater than 0".into()));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(StoreError::InvalidConfig(
                "cleanup_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn with_cleanup_interval_ms(mut self, interval_ms: u64) -> Self {
        self.cleanup_interval_ms = interval_ms;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}
