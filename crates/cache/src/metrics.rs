use std::sync::atomic::{AtomicU64, Ordering};

/// Cache counters. All monotonic, updated with relaxed ordering.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub stale_hits: AtomicU64,
    pub misses: AtomicU64,
    pub insertions: AtomicU64,
    pub evictions: AtomicU64,
    pub corrupt_drops: AtomicU64,
    pub refreshes: AtomicU64,
    pub refresh_failures: AtomicU64,
}

impl CacheMetrics {
    /// Hit rate in percent. Stale hits count as hits: the client got an
    /// answer without an inline upstream query.
    pub fn hit_rate(&self) -> f64 {
        let hits = (self.hits.load(Ordering::Relaxed) + self.stale_hits.load(Ordering::Relaxed))
            as f64;
        let total = hits + self.misses.load(Ordering::Relaxed) as f64;

        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }
}
