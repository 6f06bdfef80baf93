//! Lazily loaded attribute groups with epoch invalidation.
//!
//! A handle owns one [`Epoch`] and one [`LazyGroup`] per attribute group.
//! A group value is served only while it was loaded in the current epoch;
//! bumping the epoch invalidates every group of the handle at once without
//! touching their locks.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;

#[derive(Debug, Default)]
pub struct Epoch(AtomicU64);

impl Epoch {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

struct Slot<T> {
    loaded_epoch: u64,
    value: Arc<T>,
}

/// One attribute group, fetched as a whole.
pub struct LazyGroup<T> {
    name: &'static str,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T> std::fmt::Debug for LazyGroup<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyGroup").field("name", &self.name).finish()
    }
}

impl<T: Send + Sync> LazyGroup<T> {
    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
        }
    }

    /// A group already loaded in `epoch`, e.g. from an enumeration response.
    pub fn seeded(name: &'static str, value: T, epoch: u64) -> Self {
        Self {
            name,
            slot: Mutex::new(Some(Slot {
                loaded_epoch: epoch,
                value: Arc::new(value),
            })),
        }
    }

    /// Serve the cached value or run `fetch` once.
    ///
    /// Concurrent callers queue on the group lock; the first one fetches and
    /// the rest observe its result. A failed fetch leaves the group unloaded.
    pub async fn get_or_fetch<F, Fut>(&self, epoch: &Epoch, fetch: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        let current = epoch.current();
        if let Some(loaded) = slot.as_ref() {
            if loaded.loaded_epoch == current {
                return Ok(Arc::clone(&loaded.value));
            }
        }

        tracing::trace!(group = self.name, epoch = current, "Loading attribute group");
        let value = Arc::new(fetch().await?);
        *slot = Some(Slot {
            loaded_epoch: current,
            value: Arc::clone(&value),
        });
        Ok(value)
    }

    /// Whether a read right now would be served from cache.
    ///
    /// Returns `false` while a fetch holds the group.
    pub fn is_loaded(&self, epoch: &Epoch) -> bool {
        match self.slot.try_lock() {
            Ok(slot) => slot
                .as_ref()
                .is_some_and(|loaded| loaded.loaded_epoch == epoch.current()),
            Err(_) => false,
        }
    }
}
