use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::errors::{ConfigError, DecisionError, RefreshFailure};
use crate::flight::Flight;
use crate::frequency::FrequencyTracker;
use crate::key::{self, CacheKey};
use crate::model::AuthzRequest;
use crate::refresh::BackgroundRefresher;
use crate::report::{self, CacheReport, ConfigSummary, TopKey, WarmReport, TOP_KEYS};
use crate::source::DecisionSource;
use crate::stats::CacheStats;
use crate::store::{BoundedStore, StoreHit};
use crate::ttl;
use crate::version::{PolicyVersionProbe, PolicyVersionTracker, VersionTag};

/// Caching front for a [`DecisionSource`].
///
/// Cloning is cheap and every clone shares the same store, trackers and
/// refresh pool. Call [`CacheFacade::shutdown`] before dropping the last
/// clone to stop background refreshes.
#[derive(Clone)]
pub struct CacheFacade {
    inner: Arc<Inner>,
}

struct Inner {
    config: CacheConfig,
    source: Arc<dyn DecisionSource>,
    store: BoundedStore,
    versions: PolicyVersionTracker,
    frequency: FrequencyTracker,
    refresher: BackgroundRefresher,
    flight: Option<Flight>,
}

impl CacheFacade {
    pub async fn new(
        config: CacheConfig,
        source: Arc<dyn DecisionSource>,
        probe: Arc<dyn PolicyVersionProbe>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = BoundedStore::new(config.max_size, config.shard_count)?;
        let frequency = FrequencyTracker::new(config.frequency_capacity()?, config.hot_threshold);
        let versions = PolicyVersionTracker::new(probe).await;
        let refresher = BackgroundRefresher::new(config.worker_pool_size);
        let flight = config.enable_single_flight.then(Flight::default);

        info!(
            target: "verdict::cache",
            max_size = config.max_size,
            default_ttl_ms = config.default_ttl_ms,
            shards = store.shard_count(),
            background_refresh = config.enable_background_refresh,
            single_flight = config.enable_single_flight,
            policy_version = %versions.current(),
            "decision cache ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                source,
                store,
                versions,
                frequency,
                refresher,
                flight,
            }),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub async fn authorize(&self, request: &AuthzRequest) -> Result<bool, DecisionError> {
        self.authorize_with_ttl(request, None).await
    }

    /// Like [`authorize`](Self::authorize); a miss stores its result for
    /// `ttl_override` instead of the adaptive TTL when one is given.
    pub async fn authorize_with_ttl(
        &self,
        request: &AuthzRequest,
        ttl_override: Option<Duration>,
    ) -> Result<bool, DecisionError> {
        let inner = &self.inner;
        let key = key::encode_request(request);
        let version = inner.versions.current();

        if let Some(hit) = inner.store.get(&key, &version) {
            let frequency = inner.record_frequency(&key);
            debug!(target: "verdict::cache", key = %key, frequency, "decision cache hit");
            self.maybe_refresh(key, request, hit, frequency, &version);
            return Ok(hit.result);
        }
        debug!(target: "verdict::cache", key = %key, "decision cache miss");

        let _flight = match &inner.flight {
            Some(flight) => {
                let guard = flight.acquire(&key).await;
                if let Some(result) = inner.store.peek_valid(&key, &version) {
                    inner.record_frequency(&key);
                    return Ok(result);
                }
                Some(guard)
            }
            None => None,
        };

        let frequency = inner.record_frequency(&key);
        let result = match inner.source.evaluate(request).await {
            Ok(result) => result,
            Err(err) => {
                let err = err.with_request(request, &key);
                debug!(
                    target: "verdict::cache",
                    labels = ?err.labels(),
                    "decision source failed, nothing cached"
                );
                return Err(err);
            }
        };
        let ttl = ttl_override.unwrap_or_else(|| inner.adaptive_ttl(frequency));
        inner.store.put(key, result, ttl, version);
        Ok(result)
    }

    fn maybe_refresh(
        &self,
        key: CacheKey,
        request: &AuthzRequest,
        hit: StoreHit,
        frequency: u64,
        version: &VersionTag,
    ) {
        let config = &self.inner.config;
        if !config.enable_background_refresh || !config.enable_hot_path_optimization {
            return;
        }
        if frequency < config.hot_threshold
            || !ttl::should_refresh(hit.age, hit.ttl, config.refresh_trigger_fraction)
        {
            return;
        }
        let inner = self.inner.clone();
        let request = request.clone();
        let version = version.clone();
        let scheduled = self.inner.refresher.schedule(key, async move {
            inner.refresh_entry(key, &request, version).await
        });
        if scheduled {
            debug!(target: "verdict::cache", key = %key, "scheduled background refresh");
        }
    }

    /// Re-reads the policy version; on a change drops every entry computed
    /// under the previous one and returns how many were removed.
    pub async fn invalidate_on_policy_change(&self) -> usize {
        let inner = &self.inner;
        if !inner.config.enable_policy_aware_invalidation {
            return 0;
        }
        match inner.versions.refresh_and_detect_change().await {
            Some((old, new)) => {
                let removed = inner.store.remove_by_version(&old);
                info!(
                    target: "verdict::cache",
                    old = %old,
                    new = %new,
                    removed,
                    "policy change detected, invalidated cached decisions"
                );
                removed
            }
            None => 0,
        }
    }

    /// Pre-populates the cache. Failing requests are logged and skipped.
    pub async fn warm<I>(&self, requests: I) -> WarmReport
    where
        I: IntoIterator<Item = AuthzRequest>,
    {
        let mut report = WarmReport::default();
        for request in requests {
            report.attempted += 1;
            match self.authorize(&request).await {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        target: "verdict::cache",
                        principal = %request.principal,
                        action = %request.action,
                        resource = %request.resource,
                        "failed to warm decision: {err}"
                    );
                }
            }
        }
        info!(
            target: "verdict::cache",
            attempted = report.attempted,
            failed = report.failed,
            "cache warming completed"
        );
        report
    }

    pub fn clear(&self) {
        self.inner.store.clear();
        info!(target: "verdict::cache", "decision cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.store.stats()
    }

    pub fn reset_stats(&self) {
        self.inner.store.reset_stats();
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn current_version(&self) -> VersionTag {
        self.inner.versions.current()
    }

    pub fn frequency(&self, request: &AuthzRequest) -> u64 {
        self.inner.frequency.frequency(&key::encode_request(request))
    }

    /// TTL of the stored entry for `request`, valid or not.
    pub fn entry_ttl(&self, request: &AuthzRequest) -> Option<Duration> {
        self.inner.store.entry_ttl(&key::encode_request(request))
    }

    pub fn contains(&self, request: &AuthzRequest) -> bool {
        self.inner.store.contains(&key::encode_request(request))
    }

    pub fn pending_refreshes(&self) -> usize {
        self.inner.refresher.pending_len()
    }

    pub fn report(&self) -> CacheReport {
        let inner = &self.inner;
        let stats = inner.store.stats();
        CacheReport {
            hit_rate: stats.hit_rate(),
            miss_rate: stats.miss_rate(),
            hot_keys: inner.frequency.hot_count(),
            top_keys: inner.frequency.top(TOP_KEYS).into_iter().map(TopKey::from).collect(),
            config: ConfigSummary::from(&inner.config),
            current_size: inner.store.len(),
            stats,
        }
    }

    pub fn optimization_suggestions(&self) -> Vec<String> {
        let inner = &self.inner;
        report::suggestions(
            &inner.store.stats(),
            inner.frequency.hot_count(),
            inner.config.max_size,
        )
    }

    /// Cancels pending and running background refreshes and waits for them.
    pub async fn shutdown(&self) {
        self.inner.refresher.shutdown().await;
        info!(target: "verdict::cache", "decision cache shut down");
    }
}

impl Inner {
    fn record_frequency(&self, key: &CacheKey) -> u64 {
        if self.config.enable_hot_path_optimization {
            self.frequency.record(key)
        } else {
            0
        }
    }

    fn adaptive_ttl(&self, frequency: u64) -> Duration {
        let base = self.config.default_ttl();
        if !self.config.enable_hot_path_optimization {
            return base;
        }
        ttl::ttl_for(base, frequency, self.config.hot_threshold)
    }

    async fn refresh_entry(
        &self,
        key: CacheKey,
        request: &AuthzRequest,
        version: VersionTag,
    ) -> Result<(), RefreshFailure> {
        let result = self
            .source
            .evaluate(request)
            .await
            .map_err(|err| err.with_request(request, &key))?;
        if self.versions.current() != version {
            return Err(RefreshFailure::VersionMoved);
        }
        let ttl = self.adaptive_ttl(self.frequency.frequency(&key));
        self.store.put(key, result, ttl, version);
        Ok(())
    }
}
