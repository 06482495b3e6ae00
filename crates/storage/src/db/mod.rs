//! `PostgreSQL` aggregate store.
//!
//! ## Tables
//!
//! - `orders` - Aggregate root, one row per order
//! - `deliveries` - Recipient details (1:1, FK `order_uid`)
//! - `payments` - Payment details (1:1, FK `order_uid`)
//! - `items` - Line items (1:N, FK `order_uid`)
//!
//! # Schema
//!
//! Migrations are stored in `crates/storage/migrations/` and embedded at
//! compile time. They are not applied on service startup; run
//! `orderflow-cli migrate` (which calls [`run_migrations`]) first.

pub mod orders;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub use orders::PgOrderRepository;

/// Server-side limit for any single statement issued by this service.
const STATEMENT_TIMEOUT_MS: u64 = 5_000;

/// Order schema migrations, embedded from `crates/storage/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply any pending migrations.
///
/// Applied versions are tracked in `_sqlx_migrations`, and concurrent runners
/// serialize on an advisory lock, so this is safe to call repeatedly.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or an applied migration's
/// checksum no longer matches its file.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Every connection is opened with a `statement_timeout`, so a stuck query
/// fails instead of holding a pooled connection indefinitely.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url.expose_secret())?
        .options([("statement_timeout", STATEMENT_TIMEOUT_MS.to_string())]);

    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrator_embeds_order_schema() {
        let schema = MIGRATOR
            .iter()
            .find(|m| m.version == 20_250_101_000_001)
            .map(|m| &*m.sql)
            .unwrap_or_default();
        for table in ["orders", "deliveries", "payments", "items"] {
            assert!(schema.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")));
        }
    }
}
