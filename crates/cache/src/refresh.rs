use crate::item::CacheItem;
use crate::key::CacheKey;
use crate::metrics::CacheMetrics;
use crate::stats::RequestStats;
use crate::storage::CacheStorage;
use crate::upstream::Upstream;
use breeze_dns_domain::{CacheConfig, CacheError, DnsQuery};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Smallest delay an armed timer can have. A key whose lead time meets or
/// exceeds its lifetime refreshes almost immediately instead of never.
const MIN_ARM_DELAY: Duration = Duration::from_millis(1);

/// Per-key proactive refresh timers.
///
/// At most one pending timer exists per key: arming a key cancels and
/// replaces any previous timer. A fired timer re-queries the upstream,
/// stores the new answer through the refresh-only path (request stats are
/// never touched) and re-arms itself while the key stays hot.
pub struct RefreshScheduler {
    tasks: DashMap<CacheKey, JoinHandle<()>, FxBuildHasher>,
    storage: Arc<CacheStorage>,
    stats: Arc<RequestStats>,
    metrics: Arc<CacheMetrics>,
    upstream: Arc<dyn Upstream>,
    config: CacheConfig,
}

impl RefreshScheduler {
    pub fn new(
        storage: Arc<CacheStorage>,
        stats: Arc<RequestStats>,
        metrics: Arc<CacheMetrics>,
        upstream: Arc<dyn Upstream>,
        config: CacheConfig,
    ) -> Self {
        Self {
            tasks: DashMap::with_hasher(FxBuildHasher::default()),
            storage,
            stats,
            metrics,
            upstream,
            config,
        }
    }

    /// Arms (or re-arms) the timer for `query`, firing `refresh_lead_time`
    /// before `until_expiry` has elapsed.
    ///
    /// Callers must not hold any storage or stats guard when arming: the
    /// spawned task re-enters both.
    pub fn arm(self: &Arc<Self>, query: DnsQuery, until_expiry: Duration) {
        if !self.config.optimistic {
            return;
        }
        let delay = until_expiry
            .saturating_sub(self.config.refresh_lead_time())
            .max(MIN_ARM_DELAY);
        self.schedule(query, delay);
    }

    fn schedule(self: &Arc<Self>, query: DnsQuery, delay: Duration) {
        let key = CacheKey::from_query(&query, self.config.subnet_aware);

        debug!(name = %query.name, delay_ms = delay.as_millis() as u64, "Arming proactive refresh");

        let scheduler = Arc::clone(self);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            scheduler.fire(task_key, query, delay).await;
        });
        if let Some(prev) = self.tasks.insert(key, handle) {
            // Replaces any earlier timer for this key. When the caller is
            // the firing task itself this aborts a task with no awaits
            // left, which is a no-op.
            prev.abort();
        }
    }

    /// True when a timer for `key` is armed and has not completed.
    pub fn pending(&self, key: &CacheKey) -> bool {
        self.tasks
            .get(key)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Number of armed, not yet completed timers.
    pub fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Cancels every pending timer.
    pub fn shutdown(&self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
        self.tasks.clear();
    }

    async fn fire(self: Arc<Self>, key: CacheKey, query: DnsQuery, delay: Duration) {
        sleep(delay).await;

        let exchanged = timeout(
            self.config.upstream_timeout(),
            self.upstream.exchange(&query),
        )
        .await
        .unwrap_or(Err(CacheError::UpstreamTimeout));

        let response = match exchanged {
            Ok(response) => response,
            Err(e) => {
                self.metrics.refresh_failures.fetch_add(1, Ordering::Relaxed);
                warn!(name = %query.name, error = %e, "Proactive refresh failed, keeping stale entry");
                self.tasks.remove(&key);
                return;
            }
        };

        // Refresh-only store path: the item is written without recording a
        // request, so refreshes never feed the hotness they depend on.
        let Some(item) = CacheItem::from_response(
            &response,
            self.upstream.address(),
            self.config.min_ttl,
            self.config.max_ttl,
        ) else {
            debug!(name = %query.name, "Refreshed response not cacheable, stopping");
            self.tasks.remove(&key);
            return;
        };

        self.storage.insert(key.clone(), &item);
        self.metrics.refreshes.fetch_add(1, Ordering::Relaxed);
        debug!(name = %query.name, ttl = item.ttl, "Proactive refresh stored new answer");

        if self.stats.is_hot(&key) {
            let lifetime = Duration::from_secs(u64::from(item.ttl));
            let lead = self.config.refresh_lead_time();
            // A lead time meeting or exceeding the lifetime degrades to one
            // refresh per lifetime; re-firing on the minimal delay would
            // hammer the upstream in a tight loop.
            let next = if lead < lifetime {
                lifetime - lead
            } else {
                lifetime
            };
            self.schedule(query, next);
        } else {
            debug!(name = %query.name, "Key went cold, stopping proactive refresh");
            self.tasks.remove(&key);
        }
    }
}
