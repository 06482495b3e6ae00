//! Cache store for order aggregates.
//!
//! Entries are JSON-encoded [`Order`] values under `order:<order_uid>` keys,
//! written with a server-side expiry. The cache is a derived copy; the
//! aggregate store stays the source of truth.

mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use orderflow_core::{Order, OrderUid};

pub use redis_cache::{RedisOrderCache, connect};

/// Lifetime of a cache entry (72 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(72 * 60 * 60);

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Transport or protocol error from Redis.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored entry could not be decoded. Treated as a hard error, not a miss.
    #[error("corrupted cache entry {key}: {source}")]
    Corrupted {
        /// Key of the unreadable entry.
        key: String,
        /// Decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// The order could not be encoded for storage.
    #[error("failed to encode order for cache: {0}")]
    Encode(#[source] serde_json::Error),

    /// The operation did not complete within the configured timeout.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Key-value cache of order aggregates.
#[async_trait]
pub trait OrderCache: Send + Sync {
    /// Look up an order. Returns `Ok(None)` on a miss.
    async fn get(&self, uid: &OrderUid) -> Result<Option<Order>, CacheError>;

    /// Store an order with an expiry, overwriting any existing entry.
    async fn set(&self, order: &Order, ttl: Duration) -> Result<(), CacheError>;

    /// Number of order entries currently resident.
    async fn count(&self) -> Result<u64, CacheError>;

    /// Ids of all order entries currently resident.
    async fn list_cached_ids(&self) -> Result<Vec<OrderUid>, CacheError>;

    /// Remaining lifetime of an entry, `None` if the key is absent.
    async fn ttl(&self, uid: &OrderUid) -> Result<Option<Duration>, CacheError>;

    /// Check connectivity.
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Decode a cached JSON entry.
pub(crate) fn decode_entry(key: &str, raw: &str) -> Result<Order, CacheError> {
    serde_json::from_str(raw).map_err(|source| CacheError::Corrupted {
        key: key.to_owned(),
        source,
    })
}

/// Encode an order for caching.
pub(crate) fn encode_entry(order: &Order) -> Result<String, CacheError> {
    order.to_json().map_err(CacheError::Encode)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use orderflow_core::fixtures::sample_order;

    use super::*;

    #[test]
    fn test_default_ttl_is_72_hours() {
        assert_eq!(DEFAULT_TTL.as_secs(), 259_200);
    }

    #[test]
    fn test_entry_round_trip() {
        let order = sample_order("A1");
        let raw = encode_entry(&order).unwrap();
        assert_eq!(decode_entry("order:A1", &raw).unwrap(), order);
    }

    #[test]
    fn test_entry_keeps_exact_amounts_and_microseconds() {
        let mut order = sample_order("A1");
        order.payment.amount = "12345678901234567.89".parse().unwrap();
        order.items[0].total_price = "0.000000000000000001".parse().unwrap();
        order.date_created += chrono::Duration::microseconds(123_456);

        let raw = encode_entry(&order).unwrap();
        assert_eq!(decode_entry("order:A1", &raw).unwrap(), order);
    }

    #[test]
    fn test_corrupted_entry_names_key() {
        let err = decode_entry("order:A1", "{not json").unwrap_err();
        assert!(matches!(err, CacheError::Corrupted { ref key, .. } if key == "order:A1"));
        assert!(err.to_string().starts_with("corrupted cache entry order:A1"));
    }
}
