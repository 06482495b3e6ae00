//! Redis implementation of [`OrderCache`].
//!
//! Uses a single multiplexed [`ConnectionManager`], which reconnects on its
//! own after transport failures. Every round-trip is bounded by the cache's
//! operation timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use orderflow_core::{CACHE_KEY_PREFIX, Order, OrderUid};

use super::{CacheError, OrderCache, decode_entry, encode_entry};

/// Keys requested per `SCAN` round-trip.
const SCAN_COUNT: usize = 500;

/// Open a managed Redis connection.
///
/// # Errors
///
/// Returns `CacheError::Redis` if the URL is invalid or the server cannot be
/// reached.
pub async fn connect(redis_url: &SecretString) -> Result<ConnectionManager, CacheError> {
    let client = redis::Client::open(redis_url.expose_secret())?;
    let manager = ConnectionManager::new(client).await?;
    Ok(manager)
}

/// Order cache backed by Redis.
///
/// Cheap to clone; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisOrderCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisOrderCache {
    /// Create a cache over an established connection.
    #[must_use]
    pub const fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }

    /// Await a Redis call, failing with `CacheError::Timeout` if it takes
    /// longer than the operation timeout.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }

    /// All keys in the order namespace.
    ///
    /// Walks the keyspace with `SCAN` so a large cache never blocks the server
    /// the way `KEYS` would. `SCAN` may repeat keys across pages; the result is
    /// deduplicated.
    async fn scan_order_keys(&self) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{CACHE_KEY_PREFIX}*");
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .bounded(
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_COUNT)
                        .query_async(&mut conn),
                )
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl OrderCache for RedisOrderCache {
    #[instrument(skip(self), fields(order_uid = %uid))]
    async fn get(&self, uid: &OrderUid) -> Result<Option<Order>, CacheError> {
        let key = uid.cache_key();
        let mut conn = self.conn.clone();

        let raw: Option<String> = self.bounded(conn.get(&key)).await?;
        let Some(raw) = raw else {
            debug!("Cache miss");
            return Ok(None);
        };

        debug!(bytes = raw.len(), "Cache hit");
        decode_entry(&key, &raw).map(Some).inspect_err(|e| {
            warn!(error = %e, "Unreadable cache entry");
        })
    }

    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    async fn set(&self, order: &Order, ttl: Duration) -> Result<(), CacheError> {
        let key = order.order_uid.cache_key();
        let payload = encode_entry(order)?;
        let mut conn = self.conn.clone();

        // Redis rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let bytes = payload.len();
        self.bounded(conn.set_ex::<_, _, ()>(&key, payload, seconds))
            .await?;

        debug!(bytes, ttl_secs = seconds, "Cached order");
        Ok(())
    }

    async fn count(&self) -> Result<u64, CacheError> {
        let keys = self.scan_order_keys().await?;
        Ok(keys.len() as u64)
    }

    async fn list_cached_ids(&self) -> Result<Vec<OrderUid>, CacheError> {
        let keys = self.scan_order_keys().await?;
        Ok(keys
            .iter()
            .filter_map(|key| OrderUid::from_cache_key(key))
            .collect())
    }

    async fn ttl(&self, uid: &OrderUid) -> Result<Option<Duration>, CacheError> {
        let key = uid.cache_key();
        let mut conn = self.conn.clone();

        // -2: key absent, -1: key without expiry
        let millis: i64 = self
            .bounded(redis::cmd("PTTL").arg(&key).query_async(&mut conn))
            .await?;

        Ok(match millis {
            -2 => None,
            -1 => Some(Duration::MAX),
            ms => Some(Duration::from_millis(u64::try_from(ms).unwrap_or(0))),
        })
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}
