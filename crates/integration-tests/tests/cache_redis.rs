//! Cache store against a live Redis.
//!
//! Run with: cargo test -p orderflow-integration-tests -- --ignored

use std::time::Duration;

use orderflow_core::OrderUid;
use orderflow_integration_tests::{redis_cache, unique_order};
use orderflow_storage::{DEFAULT_TTL, OrderCache};

#[tokio::test]
#[ignore = "Requires running Redis"]
async fn test_set_then_get() {
    let cache = redis_cache().await;
    let order = unique_order("redis-get");

    cache.set(&order, DEFAULT_TTL).await.expect("set failed");
    let cached = cache.get(&order.order_uid).await.expect("get failed");
    assert_eq!(cached, Some(order));
}

#[tokio::test]
#[ignore = "Requires running Redis"]
async fn test_missing_key_is_miss() {
    let cache = redis_cache().await;
    let cached = cache
        .get(&OrderUid::new("redis-never-written"))
        .await
        .expect("get failed");
    assert_eq!(cached, None);
}

#[tokio::test]
#[ignore = "Requires running Redis"]
async fn test_ttl_is_72_hours() {
    let cache = redis_cache().await;
    let order = unique_order("redis-ttl");

    cache.set(&order, DEFAULT_TTL).await.expect("set failed");
    let ttl = cache
        .ttl(&order.order_uid)
        .await
        .expect("ttl failed")
        .expect("key missing");
    assert!(ttl <= DEFAULT_TTL);
    assert!(ttl > DEFAULT_TTL - Duration::from_secs(60));
}

#[tokio::test]
#[ignore = "Requires running Redis"]
async fn test_entry_expires() {
    let cache = redis_cache().await;
    let order = unique_order("redis-expiry");

    cache.set(&order, Duration::from_secs(1)).await.expect("set failed");
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(cache.get(&order.order_uid).await.expect("get failed"), None);
    assert_eq!(cache.ttl(&order.order_uid).await.expect("ttl failed"), None);
}

#[tokio::test]
#[ignore = "Requires running Redis"]
async fn test_count_and_list_include_written_order() {
    let cache = redis_cache().await;
    let order = unique_order("redis-count");

    cache.set(&order, DEFAULT_TTL).await.expect("set failed");

    assert!(cache.count().await.expect("count failed") >= 1);
    let ids = cache.list_cached_ids().await.expect("list failed");
    assert!(ids.contains(&order.order_uid));
}

#[tokio::test]
#[ignore = "Requires running Redis"]
async fn test_ping() {
    let cache = redis_cache().await;
    cache.ping().await.expect("ping failed");
}
