use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for a context store.
pub struct Metrics {
    start_ms: u64,
    pub hits_total: AtomicU64,
    pub misses_total: AtomicU64,
    pub writes_total: AtomicU64,
    pub expired_total: AtomicU64,
    pub evictions_total: AtomicU64,
    pub sweeps_total: AtomicU64,
}

impl Metrics {
    /// `start_ms` is read from the owning store's clock.
    pub fn new(start_ms: u64) -> Self {
        Self {
            start_ms,
            hits_total: AtomicU64::new(0),
            misses_total: AtomicU64::new(0),
            writes_total: AtomicU64::new(0),
            expired_total: AtomicU64::new(0),
            evictions_total: AtomicU64::new(0),
            sweeps_total: AtomicU64::new(0),
        }
    }

    pub fn uptime_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    pub fn inc_hit(&self) {
        self.hits_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_miss(&self) {
        self.misses_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_write(&self) {
        self.writes_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_expired(&self, n: u64) {
        self.expired_total.fetch_add(n, Ordering::Relaxed);
    }
    pub fn inc_evictions(&self, n: u64) {
        self.evictions_total.fetch_add(n, Ordering::Relaxed);
    }
    pub fn inc_sweeps(&self) {
        self.sweeps_total.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of a store, for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub uptime_ms: u64,
    pub entries: usize,
    pub capacity: usize,
    pub hits_total: u64,
    pub misses_total: u64,
    pub writes_total: u64,
    pub expired_total: u64,   // lazy + swept
    pub evictions_total: u64, // capacity evictions only
    pub sweeps_total: u64,
}

impl StoreStats {
    /// Read hit rate (0.0 - 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits_total + self.misses_total;
        if total == 0 {
            0.0
        } else {
            (self.hits_total as f64 / total as f64) * 100.0
        }
    }
}
