use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Application-wide error type returned by the orchestrators and the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Blank or otherwise unusable user input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Session text contained no non-empty lines.
    #[error("No valid lines found. Paste at least one prompt.")]
    EmptySession,

    /// The daily session-analysis limit has been reached.
    #[error("Daily limit reached. You can analyze {limit} sessions per day. Please come back tomorrow.")]
    QuotaExceeded { limit: u32 },

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the SQLite usage store.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::EmptySession => StatusCode::BAD_REQUEST,
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for showing to the end user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::EmptySession | AppError::QuotaExceeded { .. } => self.to_string(),
            _ => "Unexpected server error.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(format!("Invalid configuration: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptySession.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::QuotaExceeded { limit: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Internal("mutex poisoned".into());
        assert_eq!(err.public_message(), "Unexpected server error.");
        let err = AppError::Validation("Please enter a prompt first.".into());
        assert_eq!(err.public_message(), "Please enter a prompt first.");
    }

    #[tokio::test]
    async fn test_elapsed_message_has_single_prefix() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();

        let err = AppError::from(elapsed);
        assert_eq!(err.to_string(), "Operation timed out: deadline has elapsed");
    }
}
