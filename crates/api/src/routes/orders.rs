//! Order lookup route.

use axum::{
    Json,
    extract::{Path, State},
};
use orderflow_core::{Order, OrderUid};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Return an order as JSON, from the cache when possible.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>> {
    let uid = OrderUid::new(order_uid);

    state
        .lookup()
        .find(&uid)
        .await?
        .into_order()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {uid}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use orderflow_core::fixtures::sample_order;
    use orderflow_storage::{DEFAULT_TTL, OrderCache};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::state::test_support::memory_state;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_get_order_from_cache() {
        let (state, store, cache) = memory_state();
        cache.set(&sample_order("A1"), DEFAULT_TTL).await.unwrap();

        let (status, content_type, body) = get(router(state), "/orders/A1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["order_uid"], "A1");
        assert_eq!(body["items"][0]["price"].to_string(), "453.5");
        assert_eq!(store.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_order_from_store_then_cache() {
        let (state, store, cache) = memory_state();
        store.insert(sample_order("A1"));
        let app = router(state);

        let (status, _, body) = get(app.clone(), "/orders/A1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::to_value(sample_order("A1")).unwrap());

        for _ in 0..100 {
            if cache.contains("A1") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (status, _, _) = get(app, "/orders/A1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_order_is_404() {
        let (state, _, _) = memory_state();

        let (status, content_type, body) = get(router(state), "/orders/UNKNOWN").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, json!({ "error": "Not found: order UNKNOWN" }));
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let (state, store, _) = memory_state();
        store.set_unavailable(true);

        let (status, _, body) = get(router(state), "/orders/A1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_cache_outage_still_serves_from_store() {
        let (state, store, cache) = memory_state();
        store.insert(sample_order("A1"));
        cache.set_unavailable(true);

        let (status, _, body) = get(router(state), "/orders/A1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order_uid"], "A1");
    }
}
