//! The aggregate store contract.

use async_trait::async_trait;
use orderflow_core::{Order, OrderUid, PayloadError, ValidationError};
use tracing::{debug, instrument};

/// Errors that can occur during aggregate store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The raw payload could not be decoded. Nothing was sent to the database.
    #[error("malformed order payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// The aggregate violates an invariant. Nothing was sent to the database.
    #[error("invalid order: {0}")]
    Invalid(#[from] ValidationError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<PayloadError> for StoreError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Decode(e) => Self::Decode(e),
            PayloadError::Invalid(e) => Self::Invalid(e),
        }
    }
}

/// Result of persisting an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// All four tables were written in one committed transaction.
    Created,
    /// An order with this uid was already persisted; nothing was written.
    AlreadyExists,
}

/// Authoritative storage for order aggregates.
///
/// Orders are immutable once saved: there is no update or delete path.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch a fully populated aggregate by id.
    ///
    /// Returns `Ok(None)` when no root row exists; a partial aggregate is never
    /// returned.
    async fn get_by_id(&self, uid: &OrderUid) -> Result<Option<Order>, StoreError>;

    /// Persist an aggregate atomically.
    ///
    /// Saving an order whose uid is already stored is not an error; it returns
    /// [`SaveOutcome::AlreadyExists`] and leaves the stored rows untouched, so
    /// redelivered stream messages are harmless.
    async fn save(&self, order: &Order) -> Result<SaveOutcome, StoreError>;

    /// All stored order ids, newest creation time first.
    async fn list_all_ids(&self) -> Result<Vec<OrderUid>, StoreError>;

    /// Check connectivity.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Decode, validate, and persist a raw stream payload.
///
/// Decode and validation failures are reported before the store is touched.
/// On success the decoded aggregate is returned so callers can cache exactly
/// what was persisted.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] or [`StoreError::Invalid`] for bad payloads,
/// and any error from [`OrderStore::save`].
#[instrument(skip(store, payload), fields(bytes = payload.len()))]
pub async fn save_payload(
    store: &dyn OrderStore,
    payload: &[u8],
) -> Result<(Order, SaveOutcome), StoreError> {
    let order = Order::parse_payload(payload)?;
    let outcome = store.save(&order).await?;
    debug!(order_uid = %order.order_uid, ?outcome, "Saved order payload");
    Ok((order, outcome))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orderflow_core::fixtures::sample_order;

    use super::*;
    use crate::memory::MemoryOrderStore;

    #[tokio::test]
    async fn test_save_payload_round_trip() {
        let store = MemoryOrderStore::new();
        let order = sample_order("A1");
        let payload = order.to_json().unwrap();

        let (decoded, outcome) = save_payload(&store, payload.as_bytes()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Created);
        assert_eq!(decoded, order);

        let stored = store.get_by_id(&order.order_uid).await.unwrap();
        assert_eq!(stored, Some(order));
    }

    #[tokio::test]
    async fn test_save_payload_decode_error_never_reaches_store() {
        let store = MemoryOrderStore::new();
        let err = save_payload(&store, b"{broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_payload_invalid_never_reaches_store() {
        let store = MemoryOrderStore::new();
        let mut order = sample_order("A1");
        order.delivery.address.clear();
        let payload = order.to_json().unwrap();

        let err = save_payload(&store, payload.as_bytes()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Invalid(ValidationError::MissingField("delivery.address"))
        ));
        assert_eq!(store.save_calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_payload_redelivery_is_idempotent() {
        let store = MemoryOrderStore::new();
        let payload = sample_order("A1").to_json().unwrap();

        let (_, first) = save_payload(&store, payload.as_bytes()).await.unwrap();
        let (_, second) = save_payload(&store, payload.as_bytes()).await.unwrap();
        assert_eq!(first, SaveOutcome::Created);
        assert_eq!(second, SaveOutcome::AlreadyExists);
        assert_eq!(store.len(), 1);
    }
}
