use crate::item::CacheItem;
use crate::key::CacheKey;
use crate::maintenance::MaintenanceJob;
use crate::metrics::CacheMetrics;
use crate::refresh::RefreshScheduler;
use crate::stats::RequestStats;
use crate::storage::CacheStorage;
use crate::ttl::STALE_ANSWER_TTL;
use crate::upstream::Upstream;
use breeze_dns_domain::{CacheConfig, ConfigError, DnsQuery, DnsResponse};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Who produced the response being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    /// Client-triggered cache miss resolved by the request path.
    ClientMiss,
    /// Scheduler-triggered proactive refresh. Never touches request stats.
    Refresh,
}

/// An answer served from cache. Record TTLs are rewritten to the remaining
/// lifetime; stale answers carry [`STALE_ANSWER_TTL`].
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub response: DnsResponse,
    pub upstream: Arc<str>,
    pub stale: bool,
}

/// The cache entry point the request-handling path talks to.
///
/// `lookup` never blocks on network I/O; the only intentionally blocking
/// upstream call in this subsystem runs on the scheduler's background
/// timers.
pub struct ProxyCache {
    config: CacheConfig,
    storage: Arc<CacheStorage>,
    stats: Arc<RequestStats>,
    scheduler: Arc<RefreshScheduler>,
    metrics: Arc<CacheMetrics>,
}

impl ProxyCache {
    /// Builds the cache. Invalid configuration is fatal here, never at
    /// runtime.
    pub fn new(config: CacheConfig, upstream: Arc<dyn Upstream>) -> Result<Self, ConfigError> {
        config.validate()?;

        let metrics = Arc::new(CacheMetrics::default());
        let storage = Arc::new(CacheStorage::new(config.size_bytes, Arc::clone(&metrics)));
        let stats = Arc::new(RequestStats::new(
            config.cooldown_window(),
            config.cooldown_threshold,
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::clone(&storage),
            Arc::clone(&stats),
            Arc::clone(&metrics),
            upstream,
            config.clone(),
        ));

        info!(
            size_bytes = config.size_bytes,
            optimistic = config.optimistic,
            min_ttl = config.min_ttl,
            max_ttl = config.max_ttl,
            cooldown_threshold = config.cooldown_threshold,
            "Initializing DNS cache"
        );

        Ok(Self {
            config,
            storage,
            stats,
            scheduler,
            metrics,
        })
    }

    /// Serves `query` from cache.
    ///
    /// A hit records the request in the frequency tracker; crossing the hot
    /// threshold arms the refresh timer right here (dynamic activation), so
    /// a key that heats up purely from cache hits gets proactive protection
    /// without waiting for the next store.
    pub fn lookup(&self, query: &DnsQuery) -> Option<CachedAnswer> {
        let key = CacheKey::from_query(query, self.config.subnet_aware);

        let Some(found) = self.storage.get(&key) else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            debug!(name = %query.name, record_type = %query.record_type, "Cache MISS");
            return None;
        };

        if found.expired && !self.config.optimistic {
            self.storage.delete(&key);
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            debug!(name = %query.name, record_type = %query.record_type, "Cache entry expired");
            return None;
        }

        let became_hot = self.stats.record_request(&key);

        let answer = if found.expired {
            self.metrics.stale_hits.fetch_add(1, Ordering::Relaxed);
            debug!(name = %query.name, "Serving stale answer");
            CachedAnswer {
                response: found.item.response.with_ttl(STALE_ANSWER_TTL),
                upstream: Arc::clone(&found.item.upstream),
                stale: true,
            }
        } else {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            let remaining = u64::from(found.item.ttl).saturating_sub(found.elapsed.as_secs());
            CachedAnswer {
                response: found.item.response.with_ttl(remaining.max(1) as u32),
                upstream: Arc::clone(&found.item.upstream),
                stale: false,
            }
        };

        if became_hot && self.config.optimistic {
            // No storage guard is held here: `found` owns its data. The
            // scheduler may synchronously re-enter storage and stats.
            let remaining = Duration::from_secs(u64::from(found.item.ttl))
                .saturating_sub(found.elapsed);
            self.scheduler.arm(query.clone(), remaining);
        }

        Some(answer)
    }

    /// Stores an upstream response under the query's key.
    ///
    /// `origin` decides whether request statistics are updated: only
    /// client-triggered misses count. A refresh that recorded itself would
    /// keep its own key hot forever.
    pub fn store(
        &self,
        query: &DnsQuery,
        response: &DnsResponse,
        upstream: &str,
        origin: StoreOrigin,
    ) {
        let key = CacheKey::from_query(query, self.config.subnet_aware);

        let Some(item) =
            CacheItem::from_response(response, upstream, self.config.min_ttl, self.config.max_ttl)
        else {
            debug!(name = %query.name, "Response not cacheable (zero TTL), not stored");
            return;
        };

        self.storage.insert(key.clone(), &item);
        debug!(
            name = %query.name,
            record_type = %query.record_type,
            ttl = item.ttl,
            origin = ?origin,
            "Stored answer"
        );

        if origin == StoreOrigin::ClientMiss {
            self.stats.record_request(&key);
        }

        if self.config.optimistic && self.stats.is_hot(&key) {
            self.scheduler
                .arm(query.clone(), Duration::from_secs(u64::from(item.ttl)));
        }
    }

    /// Starts the periodic maintenance task and returns its handle.
    pub fn start_maintenance(&self) -> tokio::task::JoinHandle<()> {
        // In optimistic mode expired entries stay servable for one cooldown
        // window before a sweep removes them.
        let grace = if self.config.optimistic {
            self.config.cooldown_window()
        } else {
            Duration::ZERO
        };
        MaintenanceJob::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.stats),
            self.config.maintenance_interval(),
            grace,
        )
        .start()
    }

    /// Cancels all pending refresh timers.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Windowed client-request count for a query's key.
    pub fn request_count(&self, query: &DnsQuery) -> usize {
        self.stats
            .windowed_count(&CacheKey::from_query(query, self.config.subnet_aware))
    }

    /// True when a refresh timer is armed for the query's key.
    pub fn has_pending_refresh(&self, query: &DnsQuery) -> bool {
        self.scheduler
            .pending(&CacheKey::from_query(query, self.config.subnet_aware))
    }

    /// Number of armed refresh timers across all keys.
    pub fn pending_refreshes(&self) -> usize {
        self.scheduler.pending_count()
    }
}
