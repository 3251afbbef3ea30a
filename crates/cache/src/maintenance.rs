use crate::stats::RequestStats;
use crate::storage::CacheStorage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Periodic housekeeping: sweeps storage entries that expired past their
/// servable window and drops idle frequency-tracker keys.
pub struct MaintenanceJob {
    storage: Arc<CacheStorage>,
    stats: Arc<RequestStats>,
    interval: Duration,
    /// Extra life granted past expiry before a sweep removes an entry.
    stale_grace: Duration,
}

impl MaintenanceJob {
    pub fn new(
        storage: Arc<CacheStorage>,
        stats: Arc<RequestStats>,
        interval: Duration,
        stale_grace: Duration,
    ) -> Self {
        Self {
            storage,
            stats,
            interval,
            stale_grace,
        }
    }

    /// Starts the maintenance loop.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                "Cache maintenance started"
            );

            loop {
                sleep(self.interval).await;
                let swept = self.storage.sweep_expired(self.stale_grace);
                let compacted = self.stats.compact();
                if swept > 0 || compacted > 0 {
                    debug!(swept, compacted, "Maintenance cycle completed");
                }
            }
        })
    }
}
