//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur against a generation vendor.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing credential: {0} not set")]
    MissingCredential(&'static str),

    #[error("Job submission rejected ({status}): {body}")]
    SubmissionRejected { status: u16, body: String },

    #[error("Status check failed ({status}): {body}")]
    StatusCheck { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Check if error is retryable within the polling budget.
    ///
    /// Submission is never retried (vendors may queue or charge on receipt),
    /// so `SubmissionRejected` is always terminal. A status check that failed
    /// with a transport error or a transient HTTP status keeps the loop
    /// alive; a vendor 4xx during polling aborts it.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::StatusCheck { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    /// Vendor-supplied HTTP status, for verbatim passthrough to the caller.
    pub fn vendor_status(&self) -> Option<u16> {
        match self {
            ProviderError::SubmissionRejected { status, .. }
            | ProviderError::StatusCheck { status, .. } => Some(*status),
            _ => None,
        }
    }
}
