//! TTL override flows: the storage lifetime honors the configured
//! min/max overrides, and clients see the overridden remaining lifetime.

#[path = "../common/mod.rs"]
mod common;

use breeze_dns_cache::{ProxyCache, StoreOrigin};
use breeze_dns_domain::{CacheConfig, DnsAnswer, DnsResponse, RecordType};
use common::{test_query, MockUpstream};

fn cache_with_overrides(min_ttl: u32, max_ttl: u32) -> ProxyCache {
    let config = CacheConfig {
        size_bytes: 64 * 1024,
        min_ttl,
        max_ttl,
        ..Default::default()
    };
    ProxyCache::new(config, MockUpstream::new(300)).unwrap()
}

fn response(name: &str, ttl: u32) -> DnsResponse {
    DnsResponse::new(vec![DnsAnswer::new(
        name.to_owned(),
        RecordType::A,
        ttl,
        vec![1, 2, 3, 4],
    )])
}

#[tokio::test]
async fn min_ttl_raises_short_answers() {
    let cache = cache_with_overrides(600, 0);
    let query = test_query("short.example.");

    cache.store(&query, &response("short.example.", 100), "u1", StoreOrigin::ClientMiss);

    let answer = cache.lookup(&query).expect("hit");
    assert_eq!(answer.response.answers[0].ttl, 600);
}

#[tokio::test]
async fn max_ttl_caps_long_answers() {
    let cache = cache_with_overrides(0, 3600);
    let query = test_query("long.example.");

    cache.store(&query, &response("long.example.", 7200), "u1", StoreOrigin::ClientMiss);

    let answer = cache.lookup(&query).expect("hit");
    assert_eq!(answer.response.answers[0].ttl, 3600);
}

#[tokio::test]
async fn in_range_ttl_is_untouched() {
    let cache = cache_with_overrides(300, 3600);
    let query = test_query("mid.example.");

    cache.store(&query, &response("mid.example.", 600), "u1", StoreOrigin::ClientMiss);

    let answer = cache.lookup(&query).expect("hit");
    assert_eq!(answer.response.answers[0].ttl, 600);
}

#[tokio::test]
async fn multi_record_answers_live_by_the_smallest_ttl() {
    let cache = cache_with_overrides(0, 3600);
    let query = test_query("mixed.example.");

    let mixed = DnsResponse::new(vec![
        DnsAnswer::new("mixed.example.", RecordType::A, 120, vec![1, 2, 3, 4]),
        DnsAnswer::new("mixed.example.", RecordType::A, 7200, vec![5, 6, 7, 8]),
    ]);
    cache.store(&query, &mixed, "u1", StoreOrigin::ClientMiss);

    // Lifetime comes from the smallest record TTL (120s, in range), and
    // every served record carries the same remaining lifetime.
    let answer = cache.lookup(&query).expect("hit");
    assert!(answer.response.answers.iter().all(|a| a.ttl == 120));
}

#[tokio::test]
async fn empty_and_zero_ttl_answers_are_not_cached() {
    let cache = cache_with_overrides(600, 3600);

    let query = test_query("empty.example.");
    cache.store(&query, &DnsResponse::default(), "u1", StoreOrigin::ClientMiss);
    assert!(cache.lookup(&query).is_none());

    // A zero upstream TTL is "do not store", even with a min override.
    let query = test_query("zero.example.");
    cache.store(&query, &response("zero.example.", 0), "u1", StoreOrigin::ClientMiss);
    assert!(cache.lookup(&query).is_none());
    assert!(cache.is_empty());
}
