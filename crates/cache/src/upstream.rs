use async_trait::async_trait;
use breeze_dns_domain::{CacheError, DnsQuery, DnsResponse};

/// Upstream exchange capability, consumed identically by client-miss
/// resolution (from the request path) and by scheduled refresh.
///
/// Selection across multiple upstreams, retries and failover live behind
/// this trait; the cache only needs one exchange and an identifier.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn exchange(&self, query: &DnsQuery) -> Result<DnsResponse, CacheError>;

    /// Identifier recorded on items this upstream produced.
    fn address(&self) -> &str;
}
