use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::metrics::{Metrics, StoreStats};
use crate::store::entry::{ContextMap, Entry};
use crate::store::sweeper::{self, SweepHandle};
use crate::time::{Clock, SystemClock};

/// Bounded, TTL-expiring store of per-lead context maps.
///
/// Shared between request handlers through an `Arc`. Every operation takes
/// the single entry lock once, so a write (including any capacity eviction)
/// is never observed half-done. The `destroyed` flag only flips while both
/// the sweeper and entry locks are held (in that order).
pub struct ContextStore {
    entries: Mutex<HashMap<String, Entry>>,
    cfg: StoreConfig,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    destroyed: AtomicBool,
    sweeper: Mutex<Option<AbortHandle>>,
}

impl ContextStore {
    /// Create a store driven by the wall clock.
    pub fn create(cfg: StoreConfig) -> Arc<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(mut cfg: StoreConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        if cfg.capacity == 0 {
            warn!("Context store capacity 0 is not usable. Using minimum 1.");
            cfg.capacity = 1;
        }
        info!(
            "Initializing context store (capacity: {}, ttl: {}ms, sweep every {}ms)",
            cfg.capacity, cfg.ttl_ms, cfg.cleanup_interval_ms
        );
        let started_ms = clock.now_ms();
        Arc::new(Self {
            entries: Mutex::new(HashMap::with_capacity(cfg.capacity.min(1024))),
            cfg,
            clock,
            metrics: Metrics::new(started_ms),
            destroyed: AtomicBool::new(false),
            sweeper: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    /// Shallow-merge `patch` into the context for `key` and refresh its age.
    ///
    /// An expired entry is dropped before merging, so stale fields never come
    /// back under a fresh timestamp. Inserting a new key into a full store
    /// evicts the entry with the oldest write.
    pub fn set(&self, key: &str, patch: ContextMap) {
        let now = self.clock.now_ms();
        let mut map = self.entries.lock();

        if self.is_destroyed() {
            warn!("Ignoring write for {} on destroyed context store", key);
            return;
        }

        let expired = map
            .get(key)
            .is_some_and(|e| e.is_expired(now, self.cfg.ttl_ms));
        if expired {
            map.remove(key);
            self.metrics.inc_expired(1);
            debug!("Context {} expired before write, starting fresh", key);
        }

        if !map.contains_key(key) && map.len() >= self.cfg.capacity {
            if let Some(oldest) = oldest_key(&map) {
                map.remove(&oldest);
                self.metrics.inc_evictions(1);
                debug!("Context store full, evicted oldest context {}", oldest);
            }
        }

        map.entry(key.to_string())
            .or_insert_with(|| Entry::new(now))
            .merge(patch, now);
        self.metrics.inc_write();
        debug!("Updated context {} ({} entries)", key, map.len());
    }

    /// Owned snapshot of the context for `key`; empty if absent or expired.
    ///
    /// Expired entries are removed on the way out (lazy eviction).
    pub fn get(&self, key: &str) -> ContextMap {
        let now = self.clock.now_ms();
        let mut map = self.entries.lock();

        let expired = match map.get(key) {
            Some(e) => e.is_expired(now, self.cfg.ttl_ms),
            None => {
                self.metrics.inc_miss();
                return ContextMap::new();
            }
        };

        if expired {
            map.remove(key);
            self.metrics.inc_expired(1);
            self.metrics.inc_miss();
            debug!("Context {} expired, removed from store", key);
            return ContextMap::new();
        }

        self.metrics.inc_hit();
        map.get(key).map(|e| e.value.clone()).unwrap_or_default()
    }

    /// Remove the context for `key`. Missing keys are a no-op.
    pub fn clear(&self, key: &str) {
        if self.entries.lock().remove(key).is_some() {
            debug!("Cleared context {}", key);
        }
    }

    /// Whether a live (unexpired) context exists. Does not evict.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .get(key)
            .is_some_and(|e| !e.is_expired(now, self.cfg.ttl_ms))
    }

    /// Keys of all live contexts, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| !e.is_expired(now, self.cfg.ttl_ms))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Remove every expired entry.
    /// Returns number of entries removed
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let ttl_ms = self.cfg.ttl_ms;

        let mut map = self.entries.lock();
        let start_len = map.len();
        map.retain(|_, e| !e.is_expired(now, ttl_ms));
        let count = start_len.saturating_sub(map.len());
        drop(map);

        self.metrics.inc_sweeps();
        self.metrics.inc_expired(count as u64);
        if count > 0 {
            info!("Swept {} expired contexts", count);
        }
        count
    }

    /// Start the periodic expiry sweep on the current tokio runtime.
    ///
    /// Only one sweeper runs per store; starting another cancels the previous
    /// one. The task holds a weak reference and exits once the store is gone.
    pub fn start_sweeper(self: &Arc<Self>) -> Result<SweepHandle, StoreError> {
        let mut slot = self.sweeper.lock();
        if self.is_destroyed() {
            return Err(StoreError::Destroyed);
        }

        let task = sweeper::spawn(Arc::downgrade(self), self.cfg.cleanup_interval())?;
        if let Some(previous) = slot.replace(task.abort_handle()) {
            previous.abort();
            debug!("Replaced running context sweeper");
        }
        drop(slot);
        info!("Context sweeper started (every {}ms)", self.cfg.cleanup_interval_ms);
        Ok(SweepHandle::new(task.abort_handle()))
    }

    /// Cancel the sweeper and drop every entry.
    ///
    /// The store stays torn down: later writes are ignored and the sweeper
    /// cannot be restarted. Build a new store with [`ContextStore::create`].
    pub fn destroy(&self) {
        let mut slot = self.sweeper.lock();
        let mut map = self.entries.lock();
        self.destroyed.store(true, Ordering::SeqCst);

        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let dropped = map.len();
        map.clear();
        drop(map);
        drop(slot);
        info!("Context store destroyed ({} entries discarded)", dropped);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> StoreStats {
        let m = &self.metrics;
        StoreStats {
            uptime_ms: m.uptime_ms(self.clock.now_ms()),
            entries: self.len(),
            capacity: self.cfg.capacity,
            hits_total: m.hits_total.load(Ordering::Relaxed),
            misses_total: m.misses_total.load(Ordering::Relaxed),
            writes_total: m.writes_total.load(Ordering::Relaxed),
            expired_total: m.expired_total.load(Ordering::Relaxed),
            evictions_total: m.evictions_total.load(Ordering::Relaxed),
            sweeps_total: m.sweeps_total.load(Ordering::Relaxed),
        }
    }
}

/// Key with the minimum `updated_at_ms`; ties go to the first one found.
fn oldest_key(map: &HashMap<String, Entry>) -> Option<String> {
    map.iter()
        .min_by_key(|(_, e)| e.updated_at_ms)
        .map(|(k, _)| k.clone())
}
