use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache subsystem configuration. Immutable after construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Total byte-size budget for stored entries.
    #[serde(default = "default_size_bytes")]
    pub size_bytes: usize,

    /// Minimum TTL override in seconds (0 = disabled).
    #[serde(default)]
    pub min_ttl: u32,

    /// Maximum TTL override in seconds (0 = disabled).
    #[serde(default)]
    pub max_ttl: u32,

    /// Optimistic caching: proactive refresh plus stale-answer serving.
    #[serde(default)]
    pub optimistic: bool,

    /// How long before expiry a proactive refresh fires, in milliseconds.
    #[serde(default = "default_refresh_lead_time_ms")]
    pub refresh_lead_time_ms: u64,

    /// Sliding window over which client requests are counted, in seconds.
    #[serde(default = "default_cooldown_window_secs")]
    pub cooldown_window_secs: u64,

    /// Requests within the window needed to keep a key hot.
    /// 0 substitutes `DEFAULT_COOLDOWN_THRESHOLD`, negative disables the
    /// gate entirely (every key is always hot).
    #[serde(default)]
    pub cooldown_threshold: i32,

    /// Fold the client subnet prefix into cache keys.
    #[serde(default)]
    pub subnet_aware: bool,

    /// Upper bound on a single refresh exchange, in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// Interval between maintenance sweeps, in seconds.
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: default_size_bytes(),
            min_ttl: 0,
            max_ttl: 0,
            optimistic: false,
            refresh_lead_time_ms: default_refresh_lead_time_ms(),
            cooldown_window_secs: default_cooldown_window_secs(),
            cooldown_threshold: 0,
            subnet_aware: false,
            upstream_timeout_ms: default_upstream_timeout_ms(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_bytes == 0 {
            return Err(ConfigError::ZeroSizeBudget);
        }
        if self.min_ttl > 0 && self.max_ttl > 0 && self.min_ttl > self.max_ttl {
            return Err(ConfigError::TtlOverrideRange {
                min: self.min_ttl,
                max: self.max_ttl,
            });
        }
        if self.optimistic && self.refresh_lead_time_ms == 0 {
            return Err(ConfigError::ZeroLeadTime);
        }
        if self.cooldown_window_secs == 0 {
            return Err(ConfigError::ZeroCooldownWindow);
        }
        Ok(())
    }

    pub fn refresh_lead_time(&self) -> Duration {
        Duration::from_millis(self.refresh_lead_time_ms)
    }

    pub fn cooldown_window(&self) -> Duration {
        Duration::from_secs(self.cooldown_window_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }
}

fn default_size_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_refresh_lead_time_ms() -> u64 {
    1000
}

fn default_cooldown_window_secs() -> u64 {
    1800
}

fn default_upstream_timeout_ms() -> u64 {
    10_000
}

fn default_maintenance_interval_secs() -> u64 {
    60
}
