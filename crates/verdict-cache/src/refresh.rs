use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};
use verdict_errors::prelude::labels;

use crate::errors::RefreshFailure;
use crate::key::CacheKey;

type Pending = Arc<Mutex<HashSet<CacheKey>>>;

/// Removes the key from the pending set when its refresh finishes or is dropped.
struct PendingSlot {
    pending: Pending,
    key: CacheKey,
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.key);
    }
}

/// Bounded pool of refresh-ahead jobs, at most one per key.
pub struct BackgroundRefresher {
    pending: Pending,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl BackgroundRefresher {
    pub fn new(workers: usize) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashSet::new())),
            permits: Arc::new(Semaphore::new(workers.max(1))),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Queues `job` for `key` unless one is already pending or the pool is
    /// shut down. Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: CacheKey, job: F) -> bool
    where
        F: Future<Output = Result<(), RefreshFailure>> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return false;
        }
        if !self.pending.lock().insert(key) {
            return false;
        }
        let slot = PendingSlot {
            pending: self.pending.clone(),
            key,
        };
        let permits = self.permits.clone();
        let cancel = self.cancel.clone();
        let tracker = self.tracker.clone();

        self.tracker.spawn(async move {
            let _slot = slot;
            let permit = tokio::select! {
                _ = cancel.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };
            let outcome = match permit {
                None => Err(RefreshFailure::Cancelled),
                Some(permit) => {
                    let cancel = cancel.clone();
                    let handle = tracker.spawn(async move {
                        let _permit = permit;
                        tokio::select! {
                            _ = cancel.cancelled() => Err(RefreshFailure::Cancelled),
                            res = job => res,
                        }
                    });
                    match handle.await {
                        Ok(res) => res,
                        Err(err) if err.is_panic() => {
                            error!(target: "verdict::cache", key = %key, "background refresh panicked");
                            return;
                        }
                        Err(_) => Err(RefreshFailure::Cancelled),
                    }
                }
            };
            match outcome {
                Ok(()) => debug!(target: "verdict::cache", key = %key, "background refresh stored"),
                Err(RefreshFailure::Cancelled) => {
                    debug!(target: "verdict::cache", key = %key, "background refresh cancelled")
                }
                Err(failure) => {
                    let obj = failure.to_error_obj(&key);
                    warn!(
                        target: "verdict::cache",
                        key = %key,
                        code = obj.code.0,
                        labels = ?labels(&obj),
                        "background refresh failed: {failure}"
                    );
                }
            }
        });
        true
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.lock().contains(key)
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels queued and running refreshes and waits for every task to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;
    use crate::key;

    fn k(name: &str) -> CacheKey {
        key::encode(name, "read", "doc", None, None)
    }

    #[tokio::test]
    async fn duplicate_key_is_not_requeued() {
        let refresher = BackgroundRefresher::new(2);
        let gate = Arc::new(Notify::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let job = |gate: Arc<Notify>, runs: Arc<AtomicUsize>| async move {
            gate.notified().await;
            runs.fetch_add(1, Ordering::SeqCst);
            Ok::<(), RefreshFailure>(())
        };

        assert!(refresher.schedule(k("a"), job(gate.clone(), runs.clone())));
        assert!(!refresher.schedule(k("a"), job(gate.clone(), runs.clone())));
        assert!(refresher.is_pending(&k("a")));

        gate.notify_one();
        for _ in 0..100 {
            if refresher.pending_len() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(refresher.pending_len(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(refresher.schedule(k("a"), async { Ok::<(), RefreshFailure>(()) }));
        refresher.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded_by_workers() {
        let refresher = BackgroundRefresher::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for i in 0..8 {
            let active = active.clone();
            let peak = peak.clone();
            refresher.schedule(k(&format!("k{i}")), async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), RefreshFailure>(())
            });
        }
        for _ in 0..200 {
            if refresher.pending_len() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(refresher.pending_len(), 0);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        refresher.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_drops_in_flight_work() {
        let refresher = BackgroundRefresher::new(1);
        let finished = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            let finished = finished.clone();
            refresher.schedule(k(&format!("slow{i}")), async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<(), RefreshFailure>(())
            });
        }
        tokio::time::timeout(Duration::from_secs(2), refresher.shutdown())
            .await
            .expect("shutdown should not wait for slow jobs");
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert_eq!(refresher.pending_len(), 0);
        assert!(!refresher.schedule(k("late"), async { Ok::<(), RefreshFailure>(()) }));
    }

    #[tokio::test]
    async fn failures_release_the_key() {
        let refresher = BackgroundRefresher::new(1);
        refresher.schedule(k("bad"), async { Err::<(), _>(RefreshFailure::VersionMoved) });
        for _ in 0..100 {
            if refresher.pending_len() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!refresher.is_pending(&k("bad")));
        refresher.shutdown().await;
    }
}
