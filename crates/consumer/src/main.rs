//! Orderflow Consumer - Kafka ingestion worker.
//!
//! Persists every order payload from the configured topic to `PostgreSQL` and
//! caches it in Redis. Stops cleanly on SIGINT or SIGTERM.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use orderflow_consumer::config::ConsumerConfig;
use orderflow_consumer::{IngestHandler, KafkaConsumer};
use orderflow_storage::cache::connect as connect_redis;
use orderflow_storage::db::create_pool;
use orderflow_storage::{OrderCache, OrderStore, PgOrderRepository, RedisOrderCache};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = ConsumerConfig::from_env().expect("Failed to load configuration");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "orderflow_consumer=info,orderflow_storage=info,rdkafka=warn".into()
    });

    // LOG_FORMAT=json for structured log shipping, text otherwise
    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let pool = create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    let store: Arc<dyn OrderStore> = Arc::new(PgOrderRepository::new(pool));
    store.ping().await.expect("Database is unreachable");
    tracing::info!("Database pool created");

    let redis = connect_redis(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");
    let cache: Arc<dyn OrderCache> = Arc::new(RedisOrderCache::new(redis, config.cache_timeout));
    cache.ping().await.expect("Redis is unreachable");
    tracing::info!("Redis connection established");

    let handler = IngestHandler::new(store, cache);
    let consumer =
        KafkaConsumer::new(&config.kafka, handler).expect("Failed to create Kafka consumer");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    consumer.run(shutdown).await;
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping consumer");
}
