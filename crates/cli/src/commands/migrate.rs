//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! orderflow-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERFLOW_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use orderflow_storage::db::{create_pool, run_migrations};
use thiserror::Error;

use super::{MissingEnvVar, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Env(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending order schema migrations.
pub async fn run() -> Result<(), MigrateError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running order migrations...");
    run_migrations(&pool).await?;

    tracing::info!("Order migrations complete!");
    Ok(())
}
