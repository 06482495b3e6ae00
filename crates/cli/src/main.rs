//! Orderflow CLI - Operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the order tables
//! orderflow-cli migrate
//!
//! # Publish synthetic orders to the topic
//! orderflow-cli produce --count 10 --interval-ms 500
//!
//! # Inspect the cache
//! orderflow-cli cache get <order_uid>
//! orderflow-cli cache stats
//!
//! # Copy every stored order into the cache
//! orderflow-cli preload --batch-size 100
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use clap::{Parser, Subcommand};
use orderflow_storage::DEFAULT_PRELOAD_BATCH_SIZE;

mod commands;

#[derive(Parser)]
#[command(name = "orderflow-cli")]
#[command(author, version, about = "Orderflow operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the order tables if they do not exist
    Migrate,
    /// Publish synthetic orders to the Kafka topic
    Produce {
        /// Number of orders to publish
        #[arg(short, long, default_value_t = 10)]
        count: u32,

        /// Pause between orders in milliseconds
        #[arg(short, long, default_value_t = 0)]
        interval_ms: u64,
    },
    /// Inspect the Redis cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Copy every stored order into the cache
    Preload {
        /// Orders fetched concurrently per batch
        #[arg(short, long, default_value_t = DEFAULT_PRELOAD_BATCH_SIZE, allow_negative_numbers = true)]
        batch_size: i64,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show a cached order and its remaining lifetime
    Get {
        /// Order id
        order_uid: String,
    },
    /// Count and list cached order ids
    Stats,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Produce { count, interval_ms } => {
            commands::produce::run(count, Duration::from_millis(interval_ms)).await?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Get { order_uid } => commands::cache::get(&order_uid).await?,
            CacheAction::Stats => commands::cache::stats().await?,
        },
        Commands::Preload { batch_size } => commands::preload::run(batch_size).await?,
    }
    Ok(())
}
