//! Bulk copy of stored aggregates into the cache.
//!
//! Runs at service startup when the cache is empty, and on demand from the
//! operator CLI. Ids are processed newest first in fixed-size batches; each
//! batch is fetched and cached concurrently, and a failure on one id never
//! stops the rest.

use std::time::Duration;

use futures::future::join_all;
use orderflow_core::OrderUid;
use tracing::{debug, info, instrument, warn};

use crate::cache::OrderCache;
use crate::store::{OrderStore, StoreError};

/// Ids processed concurrently per batch.
pub const DEFAULT_PRELOAD_BATCH_SIZE: i64 = 100;

/// Errors that abort a preload before any entry is written.
#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    /// The batch size must be at least one.
    #[error("invalid preload batch size {0}, must be positive")]
    InvalidBatchSize(i64),

    /// The id listing could not be read from the store.
    #[error("failed to list stored order ids: {0}")]
    ListIds(#[from] StoreError),
}

/// Counters from a finished preload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Ids listed by the store.
    pub total: usize,
    /// Aggregates written to the cache.
    pub loaded: usize,
    /// Ids that could not be fetched or cached.
    pub failed: usize,
}

/// Copy every stored aggregate into the cache.
///
/// # Errors
///
/// Returns [`PreloadError::InvalidBatchSize`] when `batch_size` is not
/// positive, and [`PreloadError::ListIds`] when the id listing fails. Per-id
/// failures are logged and counted in the report instead.
#[instrument(skip(store, cache))]
pub async fn preload_from_store(
    store: &dyn OrderStore,
    cache: &dyn OrderCache,
    batch_size: i64,
    ttl: Duration,
) -> Result<PreloadReport, PreloadError> {
    let chunk = usize::try_from(batch_size)
        .ok()
        .filter(|&n| n > 0)
        .ok_or(PreloadError::InvalidBatchSize(batch_size))?;

    let ids = store.list_all_ids().await?;
    let mut report = PreloadReport {
        total: ids.len(),
        ..PreloadReport::default()
    };

    if ids.is_empty() {
        info!("No stored orders to preload");
        return Ok(report);
    }

    for (batch_no, batch) in ids.chunks(chunk).enumerate() {
        let results = join_all(batch.iter().map(|uid| load_one(store, cache, uid, ttl))).await;
        let loaded = results.iter().filter(|ok| **ok).count();

        report.loaded += loaded;
        report.failed += batch.len() - loaded;
        debug!(batch = batch_no, size = batch.len(), loaded, "Preload batch done");
    }

    info!(
        total = report.total,
        loaded = report.loaded,
        failed = report.failed,
        "Cache preload finished"
    );
    Ok(report)
}

/// Fetch one aggregate and cache it. Returns whether it was written.
async fn load_one(
    store: &dyn OrderStore,
    cache: &dyn OrderCache,
    uid: &OrderUid,
    ttl: Duration,
) -> bool {
    let order = match store.get_by_id(uid).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            warn!(order_uid = %uid, "Listed order vanished before preload");
            return false;
        }
        Err(e) => {
            warn!(order_uid = %uid, error = %e, "Failed to fetch order for preload");
            return false;
        }
    };

    match cache.set(&order, ttl).await {
        Ok(()) => true,
        Err(e) => {
            warn!(order_uid = %uid, error = %e, "Failed to cache order during preload");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orderflow_core::fixtures::{sample_order, sample_order_at};

    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::memory::{MemoryOrderCache, MemoryOrderStore};

    fn seeded_store(n: i64) -> MemoryOrderStore {
        let store = MemoryOrderStore::new();
        for i in 0..n {
            store.insert(sample_order_at(&format!("order-{i:03}"), i));
        }
        store
    }

    #[tokio::test]
    async fn test_preload_copies_every_order() {
        let store = seeded_store(250);
        let cache = MemoryOrderCache::new();

        let report = preload_from_store(&store, &cache, 100, DEFAULT_TTL)
            .await
            .unwrap();

        assert_eq!(
            report,
            PreloadReport {
                total: 250,
                loaded: 250,
                failed: 0
            }
        );
        assert_eq!(cache.count().await.unwrap(), 250);
        let cached = cache.get(&OrderUid::new("order-042")).await.unwrap();
        assert_eq!(cached, Some(sample_order_at("order-042", 42)));
    }

    #[tokio::test]
    async fn test_preload_rejects_non_positive_batch_size() {
        let store = seeded_store(3);
        let cache = MemoryOrderCache::new();

        for size in [0, -1] {
            let err = preload_from_store(&store, &cache, size, DEFAULT_TTL)
                .await
                .unwrap_err();
            assert!(matches!(err, PreloadError::InvalidBatchSize(n) if n == size));
        }
        assert_eq!(store.get_calls(), 0);
        assert_eq!(cache.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_preload_continues_past_failing_id() {
        let store = seeded_store(5);
        store.fail_on("order-002");
        let cache = MemoryOrderCache::new();

        let report = preload_from_store(&store, &cache, 2, DEFAULT_TTL)
            .await
            .unwrap();

        assert_eq!(report.loaded, 4);
        assert_eq!(report.failed, 1);
        assert!(!cache.contains("order-002"));
        assert!(cache.contains("order-004"));
    }

    #[tokio::test]
    async fn test_preload_empty_store() {
        let store = MemoryOrderStore::new();
        let cache = MemoryOrderCache::new();

        let report = preload_from_store(&store, &cache, 100, DEFAULT_TTL)
            .await
            .unwrap();

        assert_eq!(report, PreloadReport::default());
        assert_eq!(cache.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_preload_list_failure_aborts() {
        let store = seeded_store(2);
        store.set_unavailable(true);
        let cache = MemoryOrderCache::new();

        let err = preload_from_store(&store, &cache, 100, DEFAULT_TTL)
            .await
            .unwrap_err();
        assert!(matches!(err, PreloadError::ListIds(_)));
        assert_eq!(cache.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_preload_counts_cache_failures() {
        let store = seeded_store(3);
        let cache = MemoryOrderCache::new();
        cache.set_unavailable(true);

        let report = preload_from_store(&store, &cache, 100, DEFAULT_TTL)
            .await
            .unwrap();
        assert_eq!(report.loaded, 0);
        assert_eq!(report.failed, 3);
    }

    #[tokio::test]
    async fn test_preload_overwrites_existing_entries() {
        let store = MemoryOrderStore::new();
        store.insert(sample_order("A1"));
        let cache = MemoryOrderCache::new();
        let mut stale = sample_order("A1");
        stale.track_number = "STALE".to_owned();
        cache.set(&stale, DEFAULT_TTL).await.unwrap();

        preload_from_store(&store, &cache, 10, DEFAULT_TTL)
            .await
            .unwrap();

        let cached = cache.get(&OrderUid::new("A1")).await.unwrap().unwrap();
        assert_eq!(cached.track_number, "WBILMTESTTRACK");
    }
}
