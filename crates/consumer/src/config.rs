//! Consumer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KAFKA_BROKERS` - Comma-separated bootstrap servers
//! - `KAFKA_TOPIC` - Topic carrying order payloads
//! - `KAFKA_CONSUMER_GROUP` - Consumer group id
//! - `ORDERFLOW_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ORDERFLOW_REDIS_URL` - Redis connection string (falls back to `REDIS_URL`)
//!
//! ## Optional
//! - `ORDERFLOW_CACHE_TIMEOUT_MS` - Per-operation Redis timeout (default: 2000)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    /// Bootstrap servers, already joined with commas
    pub brokers: String,
    /// Subscribed topic
    pub topic: String,
    /// Consumer group id
    pub group_id: String,
}

/// Ingestion worker configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub kafka: KafkaSettings,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Redis connection URL (may contain password)
    pub redis_url: SecretString,
    /// Upper bound for any single Redis round-trip
    pub cache_timeout: Duration,
}

impl ConsumerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let kafka = KafkaSettings {
            brokers: normalize_brokers(&get_required_env("KAFKA_BROKERS")?)
                .ok_or_else(|| invalid("KAFKA_BROKERS", "no broker addresses"))?,
            topic: get_required_env("KAFKA_TOPIC")?,
            group_id: get_required_env("KAFKA_CONSUMER_GROUP")?,
        };

        let cache_timeout_ms = std::env::var("ORDERFLOW_CACHE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .map_err(|e| invalid("ORDERFLOW_CACHE_TIMEOUT_MS", &e.to_string()))?;

        Ok(Self {
            kafka,
            database_url: get_secret_with_fallback("ORDERFLOW_DATABASE_URL", "DATABASE_URL")?,
            redis_url: get_secret_with_fallback("ORDERFLOW_REDIS_URL", "REDIS_URL")?,
            cache_timeout: Duration::from_millis(cache_timeout_ms.max(1)),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}

/// Get a required, non-empty environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a secret, falling back to a generic variable name.
fn get_secret_with_fallback(primary_key: &str, fallback_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var(fallback_key))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Trim and rejoin a comma-separated broker list. `None` if it holds no addresses.
fn normalize_brokers(raw: &str) -> Option<String> {
    let brokers: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect();
    (!brokers.is_empty()).then(|| brokers.join(","))
}
