//! Records client error types.

use thiserror::Error;

/// Result type for records operations.
pub type RecordsResult<T> = Result<T, RecordsError>;

/// Errors that can occur against the entity store.
#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecordsError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecordsError::Network(_) | RecordsError::RateLimited(_) | RecordsError::Unavailable(_)
        )
    }

    /// Retry-After hint in milliseconds, if the store provided one.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            RecordsError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}
