//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error response carries a JSON body of the form `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::LookupError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Lookup failed on the store fallback path.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A dependency required for serving is unreachable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Lookup(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Lookup(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orderflow_storage::StoreError;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order A1".to_string());
        assert_eq!(err.to_string(), "Not found: order A1");
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(AppError::NotFound("order A1".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found: order A1" }));
    }

    #[tokio::test]
    async fn test_lookup_error_hides_details() {
        let source = serde_json::from_str::<u8>("payments row missing").unwrap_err();
        let err = AppError::from(LookupError::Store(StoreError::Decode(source)));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_unavailable_status() {
        let (status, _) = body_json(AppError::Unavailable("redis".to_string())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
