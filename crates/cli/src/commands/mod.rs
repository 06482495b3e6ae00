//! Subcommand implementations.
//!
//! Connection settings come from the same environment variables the services
//! read, with `.env` loaded first.

pub mod cache;
pub mod migrate;
pub mod preload;
pub mod produce;

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Redis round-trip limit for operator commands.
const CACHE_TIMEOUT: Duration = Duration::from_secs(5);

/// A required environment variable is missing.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVar(pub &'static str);

/// Get a required environment variable, trying each key in order.
fn required_env(keys: &[&'static str]) -> Result<String, MissingEnvVar> {
    dotenvy::dotenv().ok();
    keys.iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .ok_or(MissingEnvVar(keys.first().copied().unwrap_or("?")))
}

fn database_url() -> Result<SecretString, MissingEnvVar> {
    required_env(&["ORDERFLOW_DATABASE_URL", "DATABASE_URL"]).map(SecretString::from)
}

fn redis_url() -> Result<SecretString, MissingEnvVar> {
    required_env(&["ORDERFLOW_REDIS_URL", "REDIS_URL"]).map(SecretString::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_env_reports_first_key() {
        let err = required_env(&["ORDERFLOW_TEST_UNSET_A", "ORDERFLOW_TEST_UNSET_B"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing environment variable: ORDERFLOW_TEST_UNSET_A");
    }
}
