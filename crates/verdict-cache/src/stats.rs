use serde::Serialize;

const LOOKUP_EWMA_ALPHA: f64 = 0.1;

/// Point-in-time view of the cache counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries removed by an eager sweep after a policy change.
    pub invalidations: u64,
    pub total_requests: u64,
    pub avg_lookup_ms: f64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.total_requests.max(1) as f64
    }

    pub fn miss_rate(&self) -> f64 {
        self.misses as f64 / self.total_requests.max(1) as f64
    }
}

/// Counters owned by one store shard; only touched under that shard's lock.
///
/// Every counted lookup also feeds the shard's exponentially weighted lookup
/// latency, seeded by the shard's first sample.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShardCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub total_requests: u64,
    lookup_ewma_ms: f64,
}

impl ShardCounters {
    pub fn record_hit(&mut self, lookup_ms: f64) {
        self.hits += 1;
        self.observe_lookup(lookup_ms);
    }

    pub fn record_miss(&mut self, lookup_ms: f64) {
        self.misses += 1;
        self.observe_lookup(lookup_ms);
    }

    fn observe_lookup(&mut self, sample_ms: f64) {
        self.lookup_ewma_ms = if self.total_requests == 0 {
            sample_ms
        } else {
            LOOKUP_EWMA_ALPHA * sample_ms + (1.0 - LOOKUP_EWMA_ALPHA) * self.lookup_ewma_ms
        };
        self.total_requests += 1;
    }

    /// Sums the shards. The latency average is weighted by each shard's
    /// request count.
    pub fn combine<'a>(shards: impl IntoIterator<Item = &'a ShardCounters>) -> CacheStats {
        let mut stats = CacheStats::default();
        let mut weighted_ms = 0.0;
        for shard in shards {
            stats.hits += shard.hits;
            stats.misses += shard.misses;
            stats.evictions += shard.evictions;
            stats.invalidations += shard.invalidations;
            stats.total_requests += shard.total_requests;
            weighted_ms += shard.lookup_ewma_ms * shard.total_requests as f64;
        }
        if stats.total_requests > 0 {
            stats.avg_lookup_ms = weighted_ms / stats.total_requests as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_guard_against_zero_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            total_requests: 4,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!((stats.miss_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn shard_latency_is_seeded_then_smoothed() {
        let mut shard = ShardCounters::default();
        shard.record_miss(10.0);
        assert!((ShardCounters::combine([&shard]).avg_lookup_ms - 10.0).abs() < 1e-9);
        shard.record_hit(0.0);
        let stats = ShardCounters::combine([&shard]);
        assert!((stats.avg_lookup_ms - 9.0).abs() < 1e-9);
        assert_eq!((stats.hits, stats.misses, stats.total_requests), (1, 1, 2));
    }

    #[test]
    fn combined_latency_is_weighted_by_requests() {
        let mut busy = ShardCounters::default();
        for _ in 0..3 {
            busy.record_hit(2.0);
        }
        let mut quiet = ShardCounters::default();
        quiet.record_miss(6.0);
        quiet.evictions = 2;

        let stats = ShardCounters::combine([&busy, &quiet]);
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.evictions, 2);
        assert!((stats.avg_lookup_ms - 3.0).abs() < 1e-9);
        assert_eq!(ShardCounters::combine([]).avg_lookup_ms, 0.0);
    }
}
