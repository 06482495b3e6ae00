//! Liveness and readiness probes.

use axum::extract::State;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies that both the aggregate store and the cache respond.
/// Returns 503 Service Unavailable if either is unreachable.
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str> {
    if let Err(e) = state.store().ping().await {
        warn!(error = %e, "Readiness: store unreachable");
        return Err(AppError::Unavailable("database".to_string()));
    }
    if let Err(e) = state.cache().ping().await {
        warn!(error = %e, "Readiness: cache unreachable");
        return Err(AppError::Unavailable("cache".to_string()));
    }
    Ok("ok")
}
