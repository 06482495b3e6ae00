//! Orderflow Storage - Aggregate store and cache store.
//!
//! # Architecture
//!
//! - [`OrderStore`] - authoritative, transactional persistence of the order
//!   aggregate. Implemented by [`PgOrderRepository`] over four `PostgreSQL`
//!   tables (`orders`, `deliveries`, `payments`, `items`).
//! - [`OrderCache`] - time-limited copies of aggregates under `order:<uid>`
//!   keys. Implemented by [`RedisOrderCache`].
//! - [`preload_from_store`] - bulk copy of every stored aggregate into the cache.
//!
//! Both backends are constructed once per process and shared behind
//! `Arc<dyn ...>` handles; the pool and the Redis connection manager are safe
//! for concurrent use.
//!
//! # Schema
//!
//! The table definitions live in `crates/storage/migrations/` and are applied
//! by the operator (see [`db::run_migrations`]) before the services start.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod db;
pub mod preload;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use cache::{CacheError, DEFAULT_TTL, OrderCache, RedisOrderCache};
pub use db::PgOrderRepository;
pub use preload::{DEFAULT_PRELOAD_BATCH_SIZE, PreloadError, PreloadReport, preload_from_store};
pub use store::{OrderStore, SaveOutcome, StoreError, save_payload};
