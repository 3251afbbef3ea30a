use crate::key::CacheKey;
use crate::ttl::DEFAULT_COOLDOWN_THRESHOLD;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Sliding-window request counter deciding which keys stay hot.
///
/// Only genuine client lookups may be recorded here. The refresh path
/// stores answers without touching these counters — recording refreshes
/// would keep keys hot that nobody is asking for, and the resulting
/// self-perpetuating refresh loops starve capacity for real traffic.
pub struct RequestStats {
    entries: DashMap<CacheKey, Mutex<VecDeque<Instant>>, FxBuildHasher>,
    window: Duration,
    /// `None` disables frequency gating: every key counts as hot.
    threshold: Option<u32>,
}

impl RequestStats {
    /// `threshold` carries the configured sentinels: negative disables the
    /// gate, zero substitutes [`DEFAULT_COOLDOWN_THRESHOLD`].
    pub fn new(window: Duration, threshold: i32) -> Self {
        let threshold = match threshold {
            t if t < 0 => None,
            0 => Some(DEFAULT_COOLDOWN_THRESHOLD),
            t => Some(t as u32),
        };
        Self {
            entries: DashMap::with_hasher(FxBuildHasher::default()),
            window,
            threshold,
        }
    }

    /// Records a client request and reports whether this key crossed the
    /// hot threshold with exactly this request (edge-triggered, so callers
    /// react once per transition instead of on every hit).
    pub fn record_request(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut timestamps = entry.lock().unwrap_or_else(|e| e.into_inner());
        prune(&mut timestamps, now, self.window);
        timestamps.push_back(now);
        let count = timestamps.len();

        match self.threshold {
            // Gating disabled: the only edge worth reporting is the first
            // sighting of the key.
            None => count == 1,
            Some(n) => count == n as usize,
        }
    }

    /// Windowed count check without mutating state. Used by the refresh
    /// path to decide whether a key is still worth refreshing.
    pub fn is_hot(&self, key: &CacheKey) -> bool {
        let Some(threshold) = self.threshold else {
            return true;
        };
        let Some(entry) = self.entries.get(key) else {
            return false;
        };
        let timestamps = entry.lock().unwrap_or_else(|e| e.into_inner());
        windowed(&timestamps, self.window) >= threshold as usize
    }

    /// Windowed count for a key, for observability and tests.
    pub fn windowed_count(&self, key: &CacheKey) -> usize {
        match self.entries.get(key) {
            Some(entry) => {
                let timestamps = entry.lock().unwrap_or_else(|e| e.into_inner());
                windowed(&timestamps, self.window)
            }
            None => 0,
        }
    }

    /// Drops keys with no request inside the window, bounding memory.
    /// Returns the number of keys removed.
    pub fn compact(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, timestamps| {
            let timestamps = timestamps.lock().unwrap_or_else(|e| e.into_inner());
            windowed(&timestamps, self.window) > 0
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, tracked = self.entries.len(), "Compacted request stats");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    let Some(cutoff) = now.checked_sub(window) else {
        return;
    };
    while let Some(front) = timestamps.front() {
        if *front <= cutoff {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

fn windowed(timestamps: &VecDeque<Instant>, window: Duration) -> usize {
    match Instant::now().checked_sub(window) {
        Some(cutoff) => timestamps.iter().filter(|t| **t > cutoff).count(),
        None => timestamps.len(),
    }
}
