//! In-memory store and cache for tests.
//!
//! Enabled with the `testing` feature. Both types honour the same contracts
//! as the `PostgreSQL` and Redis backends and add failure injection and call
//! counters so callers can assert which paths ran.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use orderflow_core::{CACHE_KEY_PREFIX, Order, OrderUid};

use crate::cache::{CacheError, OrderCache, decode_entry, encode_entry};
use crate::store::{OrderStore, SaveOutcome, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected_store_failure() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

/// [`OrderStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<OrderUid, Order>>,
    failing: Mutex<HashSet<OrderUid>>,
    unavailable: AtomicBool,
    save_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an aggregate directly, bypassing validation and counters.
    pub fn insert(&self, order: Order) {
        lock(&self.orders).insert(order.order_uid.clone(), order);
    }

    /// Make `get_by_id` fail for one id.
    pub fn fail_on(&self, uid: &str) {
        lock(&self.failing).insert(OrderUid::new(uid));
    }

    /// Make every operation fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `save` calls, including rejected ones.
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_by_id` calls.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.orders).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(injected_store_failure())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get_by_id(&self, uid: &OrderUid) -> Result<Option<Order>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if lock(&self.failing).contains(uid) {
            return Err(injected_store_failure());
        }
        Ok(lock(&self.orders).get(uid).cloned())
    }

    async fn save(&self, order: &Order) -> Result<SaveOutcome, StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        order.validate()?;

        let mut orders = lock(&self.orders);
        if orders.contains_key(&order.order_uid) {
            return Ok(SaveOutcome::AlreadyExists);
        }
        orders.insert(order.order_uid.clone(), order.clone());
        Ok(SaveOutcome::Created)
    }

    async fn list_all_ids(&self) -> Result<Vec<OrderUid>, StoreError> {
        self.check_available()?;
        let orders = lock(&self.orders);
        let mut rows: Vec<&Order> = orders.values().collect();
        rows.sort_by(|a, b| {
            b.date_created
                .cmp(&a.date_created)
                .then_with(|| a.order_uid.cmp(&b.order_uid))
        });
        Ok(rows.into_iter().map(|o| o.order_uid.clone()).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[derive(Debug)]
struct Entry {
    raw: String,
    expires_at: Instant,
}

/// [`OrderCache`] backed by a `HashMap` of encoded entries.
///
/// Entries are stored as JSON text with an expiry instant, so corrupted
/// payloads and foreign keys can be planted with [`MemoryOrderCache::insert_raw`].
#[derive(Debug, Default)]
pub struct MemoryOrderCache {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
    set_calls: AtomicUsize,
}

impl MemoryOrderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value under any key.
    pub fn insert_raw(&self, key: &str, raw: &str, ttl: Duration) {
        lock(&self.entries).insert(
            key.to_owned(),
            Entry {
                raw: raw.to_owned(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Make every operation time out.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `set` calls, including failed ones.
    #[must_use]
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Whether a live entry exists for the order id.
    #[must_use]
    pub fn contains(&self, uid: &str) -> bool {
        let key = OrderUid::new(uid).cache_key();
        lock(&self.entries)
            .get(&key)
            .is_some_and(|e| e.expires_at > Instant::now())
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheError::Timeout(Duration::ZERO))
        } else {
            Ok(())
        }
    }

    /// Live keys in the order namespace.
    fn live_order_keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut entries = lock(&self.entries);
        entries.retain(|_, e| e.expires_at > now);
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(CACHE_KEY_PREFIX))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[async_trait]
impl OrderCache for MemoryOrderCache {
    async fn get(&self, uid: &OrderUid) -> Result<Option<Order>, CacheError> {
        self.check_available()?;
        let key = uid.cache_key();
        let raw = {
            let entries = lock(&self.entries);
            match entries.get(&key) {
                Some(e) if e.expires_at > Instant::now() => e.raw.clone(),
                _ => return Ok(None),
            }
        };
        decode_entry(&key, &raw).map(Some)
    }

    async fn set(&self, order: &Order, ttl: Duration) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let raw = encode_entry(order)?;
        self.insert_raw(&order.order_uid.cache_key(), &raw, ttl);
        Ok(())
    }

    async fn count(&self) -> Result<u64, CacheError> {
        self.check_available()?;
        Ok(self.live_order_keys().len() as u64)
    }

    async fn list_cached_ids(&self) -> Result<Vec<OrderUid>, CacheError> {
        self.check_available()?;
        Ok(self
            .live_order_keys()
            .iter()
            .filter_map(|k| OrderUid::from_cache_key(k))
            .collect())
    }

    async fn ttl(&self, uid: &OrderUid) -> Result<Option<Duration>, CacheError> {
        self.check_available()?;
        let now = Instant::now();
        Ok(lock(&self.entries)
            .get(&uid.cache_key())
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_available()
    }
}
