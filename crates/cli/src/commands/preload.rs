//! Manual cache preload.
//!
//! # Usage
//!
//! ```bash
//! orderflow-cli preload --batch-size 100
//! ```
//!
//! Unlike the API's startup preload, this runs even when the cache already
//! holds orders, refreshing every entry's lifetime.
//!
//! # Environment Variables
//!
//! - `ORDERFLOW_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ORDERFLOW_REDIS_URL` (or `REDIS_URL`) - Redis connection string

use orderflow_storage::cache::connect;
use orderflow_storage::db::create_pool;
use orderflow_storage::{
    CacheError, DEFAULT_TTL, PgOrderRepository, PreloadError, RedisOrderCache, preload_from_store,
};
use thiserror::Error;

use super::{CACHE_TIMEOUT, MissingEnvVar, database_url, redis_url};

/// Errors that can occur during a manual preload.
#[derive(Debug, Error)]
pub enum PreloadCommandError {
    #[error(transparent)]
    Env(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Preload failed: {0}")]
    Preload(#[from] PreloadError),
}

/// Copy every stored order into the cache.
pub async fn run(batch_size: i64) -> Result<(), PreloadCommandError> {
    let pool = create_pool(&database_url()?).await?;
    let store = PgOrderRepository::new(pool);
    let cache = RedisOrderCache::new(connect(&redis_url()?).await?, CACHE_TIMEOUT);

    let report = preload_from_store(&store, &cache, batch_size, DEFAULT_TTL).await?;

    tracing::info!(
        "Preload complete: {} listed, {} cached, {} failed",
        report.total,
        report.loaded,
        report.failed
    );
    Ok(())
}
