//! Proactive refresh flows: hot keys are refreshed before expiry, cold
//! keys are left alone, failures keep the stale entry servable.

#[path = "../common/mod.rs"]
mod common;

use breeze_dns_cache::{ProxyCache, StoreOrigin};
use common::{answer_octets, optimistic_config, test_query, MockUpstream};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn hot_key_is_refreshed_before_expiry() {
    // TTL 10s, refresh 2s before expiry, 3 requests in 60s keep a key hot.
    let upstream = MockUpstream::new(10);
    let cache = ProxyCache::new(optimistic_config(2_000, 60, 3), upstream.clone()).unwrap();
    let query = test_query("hot.example.");

    // Request 1: miss, resolved by the "request path".
    assert!(cache.lookup(&query).is_none());
    let response = upstream.exchange_once(&query).await;
    cache.store(&query, &response, "mock-upstream", StoreOrigin::ClientMiss);

    // Requests 2 and 3: cache hits. The third crosses the threshold and
    // arms the refresh timer dynamically.
    assert!(cache.lookup(&query).is_some());
    assert!(cache.lookup(&query).is_some());
    assert!(cache.has_pending_refresh(&query));
    assert_eq!(upstream.exchange_count(), 1);

    // The upstream answer changes while nobody is asking.
    upstream.set_answer(Ipv4Addr::new(9, 9, 9, 9));

    // Refresh fires at 10s - 2s = 8s.
    sleep(Duration::from_secs(9)).await;
    assert_eq!(
        upstream.exchange_count(),
        2,
        "exactly one proactive refresh, no client involved"
    );

    // A lookup at t=9s is a cache hit returning the refreshed answer.
    let answer = cache.lookup(&query).expect("cache hit after refresh");
    assert!(!answer.stale);
    assert_eq!(answer_octets(&answer.response), [9, 9, 9, 9]);
    assert_eq!(upstream.exchange_count(), 2, "the lookup hit cache, not upstream");

    cache.shutdown();
}

#[tokio::test(start_paused = true)]
async fn cold_key_sees_no_upstream_activity() {
    let upstream = MockUpstream::new(10);
    let cache = ProxyCache::new(optimistic_config(2_000, 60, 3), upstream.clone()).unwrap();
    let query = test_query("cold.example.");

    // A single request stays below the threshold.
    let response = upstream.exchange_once(&query).await;
    cache.store(&query, &response, "mock-upstream", StoreOrigin::ClientMiss);
    assert!(!cache.has_pending_refresh(&query));

    // Wait well past the would-be refresh time.
    sleep(Duration::from_secs(30)).await;
    assert_eq!(
        upstream.exchange_count(),
        1,
        "no upstream activity beyond the initial miss"
    );
}

#[tokio::test(start_paused = true)]
async fn disabled_gating_refreshes_single_request_keys() {
    let upstream = MockUpstream::new(3);
    let cache = ProxyCache::new(optimistic_config(500, 60, -1), upstream.clone()).unwrap();
    let query = test_query("any-freq.example.");

    let response = upstream.exchange_once(&query).await;
    cache.store(&query, &response, "mock-upstream", StoreOrigin::ClientMiss);
    assert!(cache.has_pending_refresh(&query));

    sleep(Duration::from_millis(2_700)).await;
    assert!(
        upstream.exchange_count() > 1,
        "refreshes even with one request when gating is disabled"
    );
    cache.shutdown();
}

#[tokio::test(start_paused = true)]
async fn repeated_stores_keep_a_single_timer() {
    let upstream = MockUpstream::new(300);
    let cache = ProxyCache::new(optimistic_config(1_000, 60, -1), upstream.clone()).unwrap();
    let query = test_query("dup.example.");
    let response = upstream.exchange_once(&query).await;

    for _ in 0..5 {
        cache.store(&query, &response, "mock-upstream", StoreOrigin::ClientMiss);
    }
    assert_eq!(cache.pending_refreshes(), 1, "at most one timer per key");
    cache.shutdown();
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_stale_answer_servable() {
    let upstream = MockUpstream::new(1);
    let cache = ProxyCache::new(optimistic_config(500, 60, -1), upstream.clone()).unwrap();
    let query = test_query("flaky.example.");

    let response = upstream.exchange_once(&query).await;
    cache.store(&query, &response, "mock-upstream", StoreOrigin::ClientMiss);

    upstream.set_failing(true);
    sleep(Duration::from_secs(2)).await;

    assert!(!cache.has_pending_refresh(&query), "failure unschedules the key");
    assert!(cache.metrics().refresh_failures.load(std::sync::atomic::Ordering::Relaxed) >= 1);

    // The stale entry is still there and servable in optimistic mode.
    // (Virtual time advanced, but the entry's wall-clock lifetime has not
    // elapsed in this test process, so this hit may be fresh or stale; the
    // point is the failed refresh did not evict it.)
    let answer = cache.lookup(&query).expect("entry survived the failed refresh");
    assert_eq!(answer_octets(&answer.response), [1, 2, 3, 4]);
}
