//! Cache inspection commands.
//!
//! # Usage
//!
//! ```bash
//! # Show one cached order and its remaining lifetime
//! orderflow-cli cache get b563feb7b2b84b6test
//!
//! # Count and list cached order ids
//! orderflow-cli cache stats
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERFLOW_REDIS_URL` (or `REDIS_URL`) - Redis connection string

use std::time::Duration;

use orderflow_core::OrderUid;
use orderflow_storage::cache::connect;
use orderflow_storage::{CacheError, OrderCache, RedisOrderCache};
use thiserror::Error;

use super::{CACHE_TIMEOUT, MissingEnvVar, redis_url};

/// Errors that can occur during cache inspection.
#[derive(Debug, Error)]
pub enum CacheCommandError {
    #[error(transparent)]
    Env(#[from] MissingEnvVar),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to render order: {0}")]
    Render(#[from] serde_json::Error),
}

async fn open_cache() -> Result<RedisOrderCache, CacheCommandError> {
    let conn = connect(&redis_url()?).await?;
    Ok(RedisOrderCache::new(conn, CACHE_TIMEOUT))
}

/// Print a cached order, or "miss".
#[allow(clippy::print_stdout)]
pub async fn get(order_uid: &str) -> Result<(), CacheCommandError> {
    let cache = open_cache().await?;
    let uid = OrderUid::new(order_uid);

    let order = cache.get(&uid).await?;
    let ttl = cache.ttl(&uid).await?;

    match order {
        Some(order) => {
            println!("{}", serde_json::to_string_pretty(&order)?);
            println!("ttl: {}", ttl.map_or_else(|| "-".to_owned(), format_ttl));
        }
        None => println!("miss: {}", uid.cache_key()),
    }
    Ok(())
}

/// Print the number of cached orders and their ids.
#[allow(clippy::print_stdout)]
pub async fn stats() -> Result<(), CacheCommandError> {
    let cache = open_cache().await?;

    let count = cache.count().await?;
    let ids = cache.list_cached_ids().await?;

    println!("cached orders: {count}");
    for id in &ids {
        println!("  {id}");
    }
    Ok(())
}

/// Render a remaining lifetime as `71h59m58s`.
fn format_ttl(ttl: Duration) -> String {
    if ttl == Duration::MAX {
        return "no expiry".to_owned();
    }
    let secs = ttl.as_secs();
    format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ttl() {
        assert_eq!(format_ttl(Duration::from_secs(72 * 3600)), "72h00m00s");
        assert_eq!(format_ttl(Duration::from_secs(3_725)), "1h02m05s");
        assert_eq!(format_ttl(Duration::from_millis(900)), "0h00m00s");
    }

    #[test]
    fn test_format_ttl_persistent_key() {
        assert_eq!(format_ttl(Duration::MAX), "no expiry");
    }
}
