mod cache;

pub use cache::CacheConfig;

use thiserror::Error;

/// Construction-time configuration failures. These are fatal: a cache is
/// never built from an invalid config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cache size budget must be greater than zero")]
    ZeroSizeBudget,

    #[error("Minimum TTL override ({min}) exceeds maximum TTL override ({max})")]
    TtlOverrideRange { min: u32, max: u32 },

    #[error("Refresh lead time must be greater than zero when optimistic caching is enabled")]
    ZeroLeadTime,

    #[error("Cooldown window must be greater than zero")]
    ZeroCooldownWindow,
}
