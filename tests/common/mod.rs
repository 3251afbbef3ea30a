//! Shared fixtures for the cache flow tests.
#![allow(dead_code)]

use async_trait::async_trait;
use breeze_dns_cache::Upstream;
use breeze_dns_domain::{CacheConfig, CacheError, DnsAnswer, DnsQuery, DnsResponse, RecordType};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Mock upstream answering every query with a single A record. Tests flip
/// the answer or the failure switch to observe refresh behavior.
pub struct MockUpstream {
    pub exchanges: AtomicU32,
    pub ttl: u32,
    answer: Mutex<Ipv4Addr>,
    fail: AtomicBool,
}

impl MockUpstream {
    pub fn new(ttl: u32) -> Arc<Self> {
        Arc::new(Self {
            exchanges: AtomicU32::new(0),
            ttl,
            answer: Mutex::new(Ipv4Addr::new(1, 2, 3, 4)),
            fail: AtomicBool::new(false),
        })
    }

    pub fn set_answer(&self, addr: Ipv4Addr) {
        *self.answer.lock().unwrap() = addr;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn exchange_count(&self) -> u32 {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// What the request path does on a miss: one exchange, answer returned
    /// for the caller to store.
    pub async fn exchange_once(&self, query: &DnsQuery) -> DnsResponse {
        self.exchange(query).await.expect("mock exchange")
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn exchange(&self, query: &DnsQuery) -> Result<DnsResponse, CacheError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::UpstreamFailed("mock upstream down".into()));
        }
        let addr = *self.answer.lock().unwrap();
        Ok(DnsResponse::new(vec![DnsAnswer::new(
            query.name.clone(),
            query.record_type,
            self.ttl,
            addr.octets().to_vec(),
        )]))
    }

    fn address(&self) -> &str {
        "mock-upstream"
    }
}

pub fn test_query(name: &str) -> DnsQuery {
    DnsQuery::new(name.to_owned(), RecordType::A)
}

/// Optimistic config with the proactive-refresh knobs the flow tests use.
pub fn optimistic_config(
    lead_time_ms: u64,
    window_secs: u64,
    threshold: i32,
) -> CacheConfig {
    CacheConfig {
        size_bytes: 64 * 1024,
        optimistic: true,
        refresh_lead_time_ms: lead_time_ms,
        cooldown_window_secs: window_secs,
        cooldown_threshold: threshold,
        ..Default::default()
    }
}

/// A-record payload of the first answer, for asserting which upstream
/// response a lookup returned.
pub fn answer_octets(response: &DnsResponse) -> [u8; 4] {
    let rdata = &response.answers[0].rdata;
    [rdata[0], rdata[1], rdata[2], rdata[3]]
}
