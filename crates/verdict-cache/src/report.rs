use serde::Serialize;

use crate::config::CacheConfig;
use crate::key::CacheKey;
use crate::stats::CacheStats;

pub const TOP_KEYS: usize = 10;

#[derive(Clone, Debug, Serialize)]
pub struct TopKey {
    pub key: String,
    pub frequency: u64,
}

impl From<(CacheKey, u64)> for TopKey {
    fn from((key, frequency): (CacheKey, u64)) -> Self {
        Self {
            key: key.to_string(),
            frequency,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfigSummary {
    pub max_size: usize,
    pub default_ttl_ms: u64,
    pub hot_threshold: u64,
    pub policy_aware_invalidation: bool,
    pub background_refresh: bool,
    pub single_flight: bool,
}

impl From<&CacheConfig> for ConfigSummary {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_size: config.max_size,
            default_ttl_ms: config.default_ttl_ms,
            hot_threshold: config.hot_threshold,
            policy_aware_invalidation: config.enable_policy_aware_invalidation,
            background_refresh: config.enable_background_refresh,
            single_flight: config.enable_single_flight,
        }
    }
}

/// Snapshot of cache health for dashboards and logs.
#[derive(Clone, Debug, Serialize)]
pub struct CacheReport {
    pub stats: CacheStats,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub hot_keys: usize,
    pub top_keys: Vec<TopKey>,
    pub config: ConfigSummary,
    pub current_size: usize,
}

/// Outcome of a warm-up batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub fn suggestions(stats: &CacheStats, hot_keys: usize, max_size: usize) -> Vec<String> {
    let mut out = Vec::new();
    if stats.hit_rate() < 0.7 {
        out.push("Consider increasing cache size: hit rate is below 70%".to_string());
    }
    if stats.avg_lookup_ms > 1.0 {
        out.push("Cache lookup time is high: consider reducing request map sizes".to_string());
    }
    if hot_keys as f64 > max_size as f64 * 0.5 {
        out.push("Many hot keys detected: consider increasing cache size".to_string());
    }
    if stats.evictions as f64 > stats.hits as f64 * 0.1 {
        out.push("High eviction rate: consider increasing cache size or reducing TTL".to_string());
    }
    out
}
