//! # Value Cache
//!
//! Last resolved value per option name, with an expiry instant.
//!
//! Each option owns a slot guarded by its own async mutex. The resolver
//! holds the slot lock for the whole "check, read stores, store entry"
//! sequence, which serialises resolutions and writes of one option without
//! ever blocking another option. The slot map itself is only locked long
//! enough to fetch the slot.

use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Horizon used when `now + timeout` overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A cached value together with its freshness deadline.
pub struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
    source_index: Option<usize>,
}

impl CacheEntry {
    /// An entry is valid iff `now < expires_at`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// The cached value, if it was stored with type `T`.
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    /// Index of the store that supplied the value, `None` for defaults.
    pub fn source_index(&self) -> Option<usize> {
        self.source_index
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("expires_at", &self.expires_at)
            .field("source_index", &self.source_index)
            .finish_non_exhaustive()
    }
}

pub type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Per-option cache owned by one resolver.
///
/// Size is bounded by the number of option names ever resolved; entries are
/// only replaced or cleared, never evicted.
#[derive(Debug)]
pub struct ValueCache {
    slots: DashMap<String, Slot>,
    timeout: Duration,
}

impl ValueCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A zero timeout disables caching.
    pub fn is_enabled(&self) -> bool {
        !self.timeout.is_zero()
    }

    /// The slot for `name`, created on first use.
    pub fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self.slots.get(name) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(name.to_string()).or_default().value())
    }

    /// Build an entry expiring one timeout from now, or `None` when caching
    /// is disabled.
    pub fn entry<T>(&self, value: T, source_index: Option<usize>) -> Option<CacheEntry>
    where
        T: Send + Sync + 'static,
    {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(self.timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);

        Some(CacheEntry {
            value: Arc::new(value),
            expires_at,
            source_index,
        })
    }

    /// Drop the entry for `name`. Waits for an in-flight resolution of the
    /// same option to finish.
    pub async fn invalidate(&self, name: &str) {
        let slot = self.slots.get(name).map(|slot| Arc::clone(slot.value()));
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let slots: Vec<Slot> = self
            .slots
            .iter()
            .map(|slot| Arc::clone(slot.value()))
            .collect();

        for slot in slots {
            *slot.lock().await = None;
        }
    }
}
