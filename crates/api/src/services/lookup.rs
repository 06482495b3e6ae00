//! Cache-aside order lookup.
//!
//! Reads go to the cache first and fall back to the aggregate store on a miss.
//! A store hit is written back to the cache in a detached task so a slow cache
//! never delays the response. At startup an empty cache is filled from the
//! store in the background.

use std::sync::Arc;
use std::time::Duration;

use orderflow_core::{Order, OrderUid};
use orderflow_storage::{
    DEFAULT_PRELOAD_BATCH_SIZE, DEFAULT_TTL, OrderCache, OrderStore, PreloadReport, StoreError,
    preload_from_store,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// Budget for a single cache write-back.
pub const WRITE_BACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for the whole startup preload, including the initial count.
pub const STARTUP_PRELOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that prevent a lookup from producing an answer.
///
/// Cache failures never appear here; they degrade to a store read.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("aggregate store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Served from the cache.
    Cached(Order),
    /// Served from the aggregate store after a cache miss.
    Stored(Order),
    /// Absent from both cache and store.
    NotFound,
}

impl Lookup {
    /// The found order, if any.
    #[must_use]
    pub fn into_order(self) -> Option<Order> {
        match self {
            Self::Cached(order) | Self::Stored(order) => Some(order),
            Self::NotFound => None,
        }
    }
}

/// Result of the startup preload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPreload {
    /// The cache already held this many orders; nothing was loaded.
    Skipped(u64),
    /// The cache was empty and a preload ran.
    Loaded(PreloadReport),
    /// Counting or preloading failed, or the time budget ran out.
    Failed,
}

/// Read orchestrator over a store and a cache.
///
/// Cheap to clone; clones share the same backends.
#[derive(Clone)]
pub struct OrderLookup {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
}

impl OrderLookup {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self { store, cache }
    }

    /// Find an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Store`] if the cache missed and the store read
    /// failed. A missing order is [`Lookup::NotFound`], not an error.
    #[instrument(skip(self), fields(order_uid = %uid))]
    pub async fn find(&self, uid: &OrderUid) -> Result<Lookup, LookupError> {
        match self.cache.get(uid).await {
            Ok(Some(order)) => {
                debug!("Served from cache");
                return Ok(Lookup::Cached(order));
            }
            Ok(None) => debug!("Cache miss, reading store"),
            Err(e) => warn!(error = %e, "Cache read failed, reading store"),
        }

        let Some(order) = self.store.get_by_id(uid).await? else {
            debug!("Order not found");
            return Ok(Lookup::NotFound);
        };

        self.spawn_write_back(order.clone());
        Ok(Lookup::Stored(order))
    }

    /// Cache an order in a detached task. Failures are logged only.
    fn spawn_write_back(&self, order: Order) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let span = info_span!("cache_write_back", order_uid = %order.order_uid);

        tokio::spawn(
            async move {
                match tokio::time::timeout(WRITE_BACK_TIMEOUT, cache.set(&order, DEFAULT_TTL)).await {
                    Ok(Ok(())) => debug!("Cache write-back done"),
                    Ok(Err(e)) => warn!(error = %e, "Cache write-back failed"),
                    Err(_) => warn!(timeout = ?WRITE_BACK_TIMEOUT, "Cache write-back timed out"),
                }
            }
            .instrument(span),
        )
    }

    /// Fill an empty cache from the store in the background.
    ///
    /// Runs once, bounded by [`STARTUP_PRELOAD_TIMEOUT`]. A cache that already
    /// holds orders is left alone.
    pub fn spawn_startup_preload(&self) -> JoinHandle<StartupPreload> {
        let lookup = self.clone();

        tokio::spawn(
            async move {
                match tokio::time::timeout(STARTUP_PRELOAD_TIMEOUT, lookup.startup_preload()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(timeout = ?STARTUP_PRELOAD_TIMEOUT, "Startup preload timed out");
                        StartupPreload::Failed
                    }
                }
            }
            .instrument(info_span!("startup_preload")),
        )
    }

    async fn startup_preload(&self) -> StartupPreload {
        let resident = match self.cache.count().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Failed to count cached orders");
                return StartupPreload::Failed;
            }
        };

        if resident > 0 {
            info!(resident, "Cache already populated, preload skipped");
            return StartupPreload::Skipped(resident);
        }

        info!("Cache is empty, preloading from store");
        match preload_from_store(
            self.store.as_ref(),
            self.cache.as_ref(),
            DEFAULT_PRELOAD_BATCH_SIZE,
            DEFAULT_TTL,
        )
        .await
        {
            Ok(report) => StartupPreload::Loaded(report),
            Err(e) => {
                warn!(error = %e, "Startup preload failed");
                StartupPreload::Failed
            }
        }
    }
}
