use crate::item::CacheItem;
use crate::key::CacheKey;
use crate::metrics::CacheMetrics;
use bytes::Bytes;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Fixed per-entry overhead charged against the byte budget on top of the
/// key and packed payload.
const ENTRY_OVERHEAD: usize = 64;

struct StoredEntry {
    data: Bytes,
    cost: usize,
    stored_at: Instant,
    /// Unix seconds of the last read, for approximate-LRU eviction.
    last_access: AtomicU64,
}

/// Outcome of a storage read. Expired entries are still returned so the
/// caller decides whether stale data is servable (optimistic mode).
pub struct Lookup {
    pub item: CacheItem,
    pub elapsed: Duration,
    pub expired: bool,
}

/// Byte-bounded keyed store for packed cache items.
///
/// Sharded via `DashMap`, so independent keys do not contend. Recency is
/// approximate: last-access timestamps have second granularity, which is
/// enough to keep frequently-read keys from being evicted ahead of
/// one-shot ones.
pub struct CacheStorage {
    entries: DashMap<CacheKey, StoredEntry, FxBuildHasher>,
    size_budget: usize,
    used_bytes: AtomicUsize,
    metrics: Arc<CacheMetrics>,
}

impl CacheStorage {
    pub fn new(size_budget: usize, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher::default()),
            size_budget,
            used_bytes: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Reads and unpacks the entry for `key`. A corrupt entry is deleted
    /// and reported as not found, never surfaced as an error.
    pub fn get(&self, key: &CacheKey) -> Option<Lookup> {
        let entry = self.entries.get(key)?;
        let elapsed = entry.stored_at.elapsed();
        match CacheItem::unpack(&entry.data) {
            Ok(item) => {
                entry.last_access.store(unix_now(), Ordering::Relaxed);
                let expired = elapsed >= Duration::from_secs(u64::from(item.ttl));
                Some(Lookup {
                    item,
                    elapsed,
                    expired,
                })
            }
            Err(e) => {
                // Must release the shard guard before removing the key.
                drop(entry);
                self.delete(key);
                self.metrics.corrupt_drops.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Dropped corrupt cache entry");
                None
            }
        }
    }

    /// Stores `item` under `key`, evicting least-recently-read entries
    /// first when the byte budget would be exceeded. A later insert for the
    /// same key overwrites, never merges.
    pub fn insert(&self, key: CacheKey, item: &CacheItem) {
        let data = item.pack();
        let cost = key.len() + data.len() + ENTRY_OVERHEAD;
        if cost > self.size_budget {
            debug!(
                cost,
                budget = self.size_budget,
                "Entry exceeds the whole cache budget, not stored"
            );
            return;
        }

        self.evict_to_fit(cost);

        let entry = StoredEntry {
            data,
            cost,
            stored_at: Instant::now(),
            last_access: AtomicU64::new(unix_now()),
        };
        if let Some(prev) = self.entries.insert(key, entry) {
            self.used_bytes.fetch_sub(prev.cost, Ordering::Relaxed);
        }
        self.used_bytes.fetch_add(cost, Ordering::Relaxed);
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delete(&self, key: &CacheKey) -> bool {
        match self.entries.remove(key) {
            Some((_, entry)) => {
                self.used_bytes.fetch_sub(entry.cost, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Removes entries that expired more than `grace` ago. Optimistic mode
    /// passes a non-zero grace so stale answers stay servable for a while.
    pub fn sweep_expired(&self, grace: Duration) -> usize {
        let mut stale = Vec::new();
        for entry in self.entries.iter() {
            let age = entry.value().stored_at.elapsed();
            let remove = match CacheItem::unpack(&entry.value().data) {
                Ok(item) => age >= Duration::from_secs(u64::from(item.ttl)) + grace,
                Err(_) => true,
            };
            if remove {
                stale.push(entry.key().clone());
            }
        }

        let mut removed = 0;
        for key in stale {
            if self.delete(&key) {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Swept expired cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Relaxed)
    }

    /// Frees enough space for an incoming entry of `incoming` bytes by
    /// removing the least-recently-read entries first.
    fn evict_to_fit(&self, incoming: usize) {
        let needed = (self.used_bytes.load(Ordering::Relaxed) + incoming)
            .saturating_sub(self.size_budget);
        if needed == 0 {
            return;
        }

        let mut candidates: Vec<(CacheKey, u64)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().last_access.load(Ordering::Relaxed)))
            .collect();
        candidates.sort_by_key(|&(_, last_access)| last_access);

        let mut freed = 0usize;
        let mut evicted = 0u64;
        for (key, _) in candidates {
            if freed >= needed {
                break;
            }
            if let Some((_, entry)) = self.entries.remove(&key) {
                self.used_bytes.fetch_sub(entry.cost, Ordering::Relaxed);
                freed += entry.cost;
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.metrics.evictions.fetch_add(evicted, Ordering::Relaxed);
            debug!(
                evicted,
                freed,
                used_bytes = self.used_bytes.load(Ordering::Relaxed),
                "Evicted least-recently-read entries"
            );
        }
    }

    #[cfg(test)]
    fn insert_raw(&self, key: CacheKey, data: Bytes) {
        let cost = key.len() + data.len() + ENTRY_OVERHEAD;
        let entry = StoredEntry {
            data,
            cost,
            stored_at: Instant::now(),
            last_access: AtomicU64::new(unix_now()),
        };
        self.entries.insert(key, entry);
        self.used_bytes.fetch_add(cost, Ordering::Relaxed);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
