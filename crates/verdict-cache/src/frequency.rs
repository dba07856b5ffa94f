use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::key::CacheKey;

/// Per-key lookup counters held in an LRU of fixed capacity.
///
/// Keys that stop being requested fall off the tail and lose their history,
/// which keeps the tracker bounded no matter how many distinct requests pass.
pub struct FrequencyTracker {
    counts: Mutex<LruCache<CacheKey, u64>>,
    hot_threshold: u64,
}

impl FrequencyTracker {
    pub fn new(capacity: NonZeroUsize, hot_threshold: u64) -> Self {
        Self {
            counts: Mutex::new(LruCache::new(capacity)),
            hot_threshold,
        }
    }

    /// Counts one lookup of `key` and returns the updated frequency.
    pub fn record(&self, key: &CacheKey) -> u64 {
        let mut counts = self.counts.lock();
        match counts.get_mut(key) {
            Some(count) => {
                *count = count.saturating_add(1);
                *count
            }
            None => {
                counts.push(*key, 1);
                1
            }
        }
    }

    pub fn frequency(&self, key: &CacheKey) -> u64 {
        self.counts.lock().peek(key).copied().unwrap_or(0)
    }

    pub fn hot_threshold(&self) -> u64 {
        self.hot_threshold
    }

    pub fn is_hot(&self, key: &CacheKey) -> bool {
        self.frequency(key) >= self.hot_threshold
    }

    pub fn hot_count(&self) -> usize {
        self.counts
            .lock()
            .iter()
            .filter(|(_, count)| **count >= self.hot_threshold)
            .count()
    }

    /// The `n` most requested keys, highest count first.
    pub fn top(&self, n: usize) -> Vec<(CacheKey, u64)> {
        let mut all: Vec<(CacheKey, u64)> = self
            .counts
            .lock()
            .iter()
            .map(|(key, count)| (*key, *count))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(n);
        all
    }

    pub fn tracked(&self) -> usize {
        self.counts.lock().len()
    }

    pub fn clear(&self) {
        self.counts.lock().clear();
    }
}
