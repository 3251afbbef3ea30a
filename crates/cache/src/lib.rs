//! Breeze DNS cache: in-memory answer cache for the forwarding proxy, with
//! TTL overrides and proactive background refresh of hot keys.

pub mod facade;
pub mod item;
pub mod key;
pub mod maintenance;
pub mod metrics;
pub mod refresh;
pub mod stats;
pub mod storage;
pub mod ttl;
pub mod upstream;

pub use facade::{CachedAnswer, ProxyCache, StoreOrigin};
pub use item::CacheItem;
pub use key::CacheKey;
pub use maintenance::MaintenanceJob;
pub use metrics::CacheMetrics;
pub use refresh::RefreshScheduler;
pub use stats::RequestStats;
pub use storage::{CacheStorage, Lookup};
pub use ttl::{effective_ttl, DEFAULT_COOLDOWN_THRESHOLD, STALE_ANSWER_TTL};
pub use upstream::Upstream;
