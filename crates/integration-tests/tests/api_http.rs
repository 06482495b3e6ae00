//! HTTP tests against a running `orderflow-api`.
//!
//! These tests require:
//! - `PostgreSQL` and Redis reachable with the test URLs
//! - The API server running against the same database and Redis
//!   (cargo run -p orderflow-api)
//!
//! Run with: cargo test -p orderflow-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::Value;

use orderflow_integration_tests::{api_base_url, pg_store, unique_order};
use orderflow_storage::OrderStore;

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", api_base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body failed"), "ok");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_readiness() {
    let resp = Client::new()
        .get(format!("{}/health/ready", api_base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_unknown_order_is_404() {
    let resp = Client::new()
        .get(format!("{}/orders/UNKNOWN", api_base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await.expect("body is not JSON");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_stored_order_is_served() {
    let store = pg_store().await;
    let order = unique_order("http-lookup");
    store.save(&order).await.expect("save failed");

    let url = format!("{}/orders/{}", api_base_url(), order.order_uid);
    let client = Client::new();

    // First read falls back to the store, second is served from the cache
    for _ in 0..2 {
        let resp = client.get(&url).send().await.expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("body is not JSON");
        assert_eq!(body, serde_json::to_value(&order).expect("encode failed"));
    }
}
