//! Per-message ingestion.
//!
//! Decodes and persists one payload, then caches the persisted aggregate.
//! Broker-agnostic: the Kafka loop decides what to do with the offset based on
//! the result.

use std::sync::Arc;

use orderflow_core::{Order, OrderUid};
use orderflow_storage::{
    CacheError, DEFAULT_TTL, OrderCache, OrderStore, SaveOutcome, StoreError, save_payload,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors that leave a message unacknowledged.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Decoding, validation, or persistence failed. Nothing was cached.
    #[error("failed to persist order: {0}")]
    Store(#[from] StoreError),

    /// The order was persisted but could not be cached. Redelivery re-runs
    /// the idempotent save and retries the cache write.
    #[error("order {order_uid} persisted but not cached: {source}")]
    Cache {
        order_uid: OrderUid,
        #[source]
        source: CacheError,
    },
}

impl IngestError {
    /// Whether redelivering the same payload can ever succeed.
    ///
    /// Decode and validation failures are properties of the payload itself.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Decode(_) | StoreError::Invalid(_))
        )
    }
}

/// A successfully ingested message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// The aggregate exactly as persisted and cached.
    pub order: Order,
    /// Whether this delivery created the order or found it already stored.
    pub outcome: SaveOutcome,
}

/// Store-then-cache handler shared by every message of a consumer.
#[derive(Clone)]
pub struct IngestHandler {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
}

impl IngestHandler {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self { store, cache }
    }

    /// Persist a raw payload and cache the result with the standard TTL.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if the payload is malformed, invalid, or
    /// cannot be written, and [`IngestError::Cache`] if only the cache write
    /// failed.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn handle(&self, payload: &[u8]) -> Result<Ingested, IngestError> {
        let (order, outcome) = save_payload(self.store.as_ref(), payload).await?;
        debug!(order_uid = %order.order_uid, ?outcome, "Order persisted");

        self.cache
            .set(&order, DEFAULT_TTL)
            .await
            .map_err(|source| IngestError::Cache {
                order_uid: order.order_uid.clone(),
                source,
            })?;

        info!(order_uid = %order.order_uid, ?outcome, "Order ingested");
        Ok(Ingested { order, outcome })
    }
}
