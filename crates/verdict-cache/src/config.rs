use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Construction-time settings of a [`CacheFacade`](crate::facade::CacheFacade).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_size: usize,
    pub default_ttl_ms: u64,
    pub hot_threshold: u64,
    pub enable_background_refresh: bool,
    /// Share of an entry's TTL that must elapse before a hot hit refreshes it.
    pub refresh_trigger_fraction: f64,
    pub worker_pool_size: usize,
    pub enable_policy_aware_invalidation: bool,
    pub enable_hot_path_optimization: bool,
    pub enable_single_flight: bool,
    pub shard_count: usize,
    /// Keys tracked by the frequency counter; 0 means twice `max_size`.
    pub frequency_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            default_ttl_ms: 300_000,
            hot_threshold: 10,
            enable_background_refresh: false,
            refresh_trigger_fraction: 0.8,
            worker_pool_size: 4,
            enable_policy_aware_invalidation: true,
            enable_hot_path_optimization: true,
            enable_single_flight: false,
            shard_count: 1,
            frequency_capacity: 0,
        }
    }
}

impl CacheConfig {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = ttl.as_millis().min(u128::from(u64::MAX)) as u64;
        self
    }

    pub fn with_hot_threshold(mut self, threshold: u64) -> Self {
        self.hot_threshold = threshold;
        self
    }

    pub fn with_background_refresh(mut self, enabled: bool) -> Self {
        self.enable_background_refresh = enabled;
        self
    }

    pub fn with_refresh_trigger_fraction(mut self, fraction: f64) -> Self {
        self.refresh_trigger_fraction = fraction;
        self
    }

    pub fn with_worker_pool_size(mut self, workers: usize) -> Self {
        self.worker_pool_size = workers;
        self
    }

    pub fn with_policy_aware_invalidation(mut self, enabled: bool) -> Self {
        self.enable_policy_aware_invalidation = enabled;
        self
    }

    pub fn with_hot_path_optimization(mut self, enabled: bool) -> Self {
        self.enable_hot_path_optimization = enabled;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.enable_single_flight = enabled;
        self
    }

    pub fn with_shard_count(mut self, shards: usize) -> Self {
        self.shard_count = shards;
        self
    }

    pub fn with_frequency_capacity(mut self, capacity: usize) -> Self {
        self.frequency_capacity = capacity;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub(crate) fn frequency_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        let raw = if self.frequency_capacity == 0 {
            self.max_size.saturating_mul(2)
        } else {
            self.frequency_capacity
        };
        NonZeroUsize::new(raw)
            .ok_or_else(|| ConfigError::invalid("frequency_capacity", "must be at least 1"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::invalid("max_size", "must be at least 1"));
        }
        if self.default_ttl_ms == 0 {
            return Err(ConfigError::invalid("default_ttl_ms", "must be positive"));
        }
        let fraction = self.refresh_trigger_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::invalid(
                "refresh_trigger_fraction",
                &format!("{fraction} is outside (0, 1)"),
            ));
        }
        if self.worker_pool_size == 0 {
            return Err(ConfigError::invalid("worker_pool_size", "must be at least 1"));
        }
        if self.shard_count == 0 {
            return Err(ConfigError::invalid("shard_count", "must be at least 1"));
        }
        Ok(())
    }
}
