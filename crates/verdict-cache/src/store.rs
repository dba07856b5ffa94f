use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::ConfigError;
use crate::key::CacheKey;
use crate::stats::{CacheStats, ShardCounters};
use crate::version::VersionTag;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub result: bool,
    pub created_at: Instant,
    pub ttl: Duration,
    pub access_count: u64,
    pub policy_version: VersionTag,
}

impl CacheEntry {
    pub fn new(result: bool, ttl: Duration, policy_version: VersionTag) -> Self {
        Self {
            result,
            created_at: Instant::now(),
            ttl,
            access_count: 0,
            policy_version,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) >= self.ttl
    }

    fn is_servable(&self, now: Instant, current: &VersionTag) -> bool {
        !self.is_expired(now) && self.policy_version == *current
    }
}

/// What a successful lookup hands back; never a reference into the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreHit {
    pub result: bool,
    pub age: Duration,
    pub ttl: Duration,
    pub access_count: u64,
}

enum Lookup {
    Absent,
    Stale,
    Hit(StoreHit),
}

struct Shard {
    entries: LruCache<CacheKey, CacheEntry>,
    counters: ShardCounters,
}

/// Capacity-bounded, recency-ordered decision store split into locked shards.
///
/// Each shard owns an LRU list and its own counters. With a single shard the
/// eviction order is an exact global LRU.
pub struct BoundedStore {
    shards: Box<[Mutex<Shard>]>,
    capacity: usize,
}

impl BoundedStore {
    pub fn new(max_size: usize, shard_count: usize) -> Result<Self, ConfigError> {
        if max_size == 0 {
            return Err(ConfigError::invalid("max_size", "must be at least 1"));
        }
        if shard_count == 0 {
            return Err(ConfigError::invalid("shard_count", "must be at least 1"));
        }
        let shard_count = shard_count.min(max_size);
        let base = max_size / shard_count;
        let remainder = max_size % shard_count;
        let mut shards = Vec::with_capacity(shard_count);
        for idx in 0..shard_count {
            let cap = base + usize::from(idx < remainder);
            let cap = NonZeroUsize::new(cap)
                .ok_or_else(|| ConfigError::invalid("max_size", "shard capacity collapsed to zero"))?;
            shards.push(Mutex::new(Shard {
                entries: LruCache::new(cap),
                counters: ShardCounters::default(),
            }));
        }
        Ok(Self {
            shards: shards.into_boxed_slice(),
            capacity: max_size,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &CacheKey) -> &Mutex<Shard> {
        &self.shards[key.shard_index(self.shards.len())]
    }

    /// Returns the entry when it is unexpired and was computed under
    /// `current`. A stale entry is removed on the spot and counts as a miss.
    pub fn get(&self, key: &CacheKey, current: &VersionTag) -> Option<StoreHit> {
        let started = Instant::now();
        let mut guard = self.shard(key).lock();
        let shard = &mut *guard;
        let lookup = match shard.entries.get_mut(key) {
            None => Lookup::Absent,
            Some(entry) if entry.is_servable(started, current) => {
                entry.access_count += 1;
                Lookup::Hit(StoreHit {
                    result: entry.result,
                    age: entry.age(started),
                    ttl: entry.ttl,
                    access_count: entry.access_count,
                })
            }
            Some(_) => Lookup::Stale,
        };
        if let Lookup::Stale = lookup {
            shard.entries.pop(key);
        }
        let lookup_ms = started.elapsed().as_secs_f64() * 1000.0;
        match lookup {
            Lookup::Hit(hit) => {
                shard.counters.record_hit(lookup_ms);
                Some(hit)
            }
            Lookup::Stale | Lookup::Absent => {
                shard.counters.record_miss(lookup_ms);
                None
            }
        }
    }

    /// Quietly checks for a servable entry without touching recency or stats.
    pub fn peek_valid(&self, key: &CacheKey, current: &VersionTag) -> Option<bool> {
        let guard = self.shard(key).lock();
        guard
            .entries
            .peek(key)
            .filter(|entry| entry.is_servable(Instant::now(), current))
            .map(|entry| entry.result)
    }

    /// Inserts at the most-recently-used position, evicting the shard's
    /// least-recently-used entry when full. Returns the evicted key.
    pub fn put(
        &self,
        key: CacheKey,
        result: bool,
        ttl: Duration,
        version: VersionTag,
    ) -> Option<CacheKey> {
        let entry = CacheEntry::new(result, ttl, version);
        let mut guard = self.shard(&key).lock();
        let shard = &mut *guard;
        match shard.entries.push(key, entry) {
            Some((displaced, _)) if displaced != key => {
                shard.counters.evictions += 1;
                debug!(target: "verdict::cache", evicted = %displaced, "evicted least recently used decision");
                Some(displaced)
            }
            _ => None,
        }
    }

    /// Drops every entry computed under `old`, one shard lock at a time.
    pub fn remove_by_version(&self, old: &VersionTag) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut guard = shard.lock();
            let shard = &mut *guard;
            let stale: Vec<CacheKey> = shard
                .entries
                .iter()
                .filter(|(_, entry)| entry.policy_version == *old)
                .map(|(key, _)| *key)
                .collect();
            for key in &stale {
                shard.entries.pop(key);
            }
            shard.counters.invalidations += stale.len() as u64;
            removed += stale.len();
        }
        removed
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.shard(key).lock().entries.pop(key).is_some()
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.shard(key).lock().entries.contains(key)
    }

    /// TTL of the stored entry, regardless of validity.
    pub fn entry_ttl(&self, key: &CacheKey) -> Option<Duration> {
        self.shard(key).lock().entries.peek(key).map(|entry| entry.ttl)
    }

    pub fn stats(&self) -> CacheStats {
        let snapshot: Vec<ShardCounters> = self
            .shards
            .iter()
            .map(|shard| shard.lock().counters.clone())
            .collect();
        ShardCounters::combine(&snapshot)
    }

    pub fn reset_stats(&self) {
        for shard in self.shards.iter() {
            shard.lock().counters = ShardCounters::default();
        }
    }
}
