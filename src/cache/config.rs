//! Cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_MAX_ENTRIES, DEFAULT_SWEEP_INTERVAL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCacheConfig {
    /// TTL applied when a request does not specify one
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Hard cap on stored entries; exceeding it evicts the oldest entry
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Interval between background sweeps of expired entries
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ApiCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl ApiCacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
