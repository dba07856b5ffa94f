#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;
use verdict_cache::prelude::*;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic stub engine: allows everything except `Action::delete`,
/// rejects principals named `User::broken`, and counts every evaluation.
#[derive(Default)]
pub struct CountingSource {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl CountingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl DecisionSource for CountingSource {
    async fn evaluate(&self, request: &AuthzRequest) -> Result<bool, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DecisionError::unavailable("stub engine offline"));
        }
        if request.principal == "User::broken" {
            return Err(DecisionError::malformed("unknown principal type"));
        }
        Ok(request.action != "Action::delete")
    }
}

pub fn policies() -> Arc<InMemoryPolicySet> {
    Arc::new(InMemoryPolicySet::new([(
        "allow-read",
        "permit(principal, action == Action::\"read\", resource);",
    )]))
}

pub async fn facade(
    config: CacheConfig,
    source: &Arc<CountingSource>,
    policies: &Arc<InMemoryPolicySet>,
) -> CacheFacade {
    CacheFacade::new(config, source.clone(), policies.clone())
        .await
        .expect("valid cache config")
}

pub fn read(principal: &str, resource: &str) -> AuthzRequest {
    AuthzRequest::new(principal, "Action::read", resource)
}

pub async fn wait_for_refreshes(cache: &CacheFacade) {
    for _ in 0..200 {
        if cache.pending_refreshes() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("background refreshes did not drain");
}
