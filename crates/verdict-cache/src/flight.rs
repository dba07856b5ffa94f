use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::key::CacheKey;

type Slots = Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>;

/// Per-key in-flight markers collapsing concurrent misses into one evaluation.
#[derive(Default, Clone)]
pub struct Flight {
    inner: Slots,
}

pub struct FlightGuard {
    key: CacheKey,
    slots: Slots,
    mutex: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Flight {
    pub async fn acquire(&self, key: &CacheKey) -> FlightGuard {
        let mutex = {
            let mut map = self.inner.lock();
            map.entry(*key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = mutex.clone().lock_owned().await;
        FlightGuard {
            key: *key,
            slots: self.inner.clone(),
            mutex,
            guard: Some(guard),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut map = self.slots.lock();
        drop(self.guard.take());
        // The map and this guard hold the only references: nobody is waiting.
        if Arc::strong_count(&self.mutex) == 2 {
            map.remove(&self.key);
        }
    }
}
