//! Engine error taxonomy.
//!
//! Every terminal outcome of a generation maps onto exactly one of these
//! variants, which the API layer translates into response codes.

use thiserror::Error;

use vox_providers::ProviderError;
use vox_records::RecordsError;
use vox_storage::StorageError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can end a generation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing credential or unconfigured provider. Fails before any
    /// outbound call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The clip cannot be submitted anywhere (missing media references).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The clip or generation record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The in-progress guard is already held for this clip.
    #[error("A generation is already running for clip {0}")]
    AlreadyRunning(String),

    /// The vendor rejected job creation. Never retried.
    #[error("Job submission failed: {0}")]
    Submission(#[source] ProviderError),

    /// A status check failed with a non-retryable error.
    #[error("Status check failed: {0}")]
    Poll(#[source] ProviderError),

    /// The vendor reported a terminal processing failure.
    #[error("Video processing failed: {message}")]
    VendorFailed {
        message: String,
        detail: Option<serde_json::Value>,
    },

    /// The attempt budget ran out while the job was still pending.
    #[error("Timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// Inline result bytes with a content type that is not media.
    #[error("Generated file has unsupported content type: {0}")]
    InvalidArtifact(String),

    /// Vault upload failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Entity-store write or read failed.
    #[error("Persistence error: {0}")]
    Persistence(#[source] RecordsError),
}

impl EngineError {
    pub fn persistence(e: RecordsError) -> Self {
        Self::Persistence(e)
    }

    /// Vendor-supplied HTTP status, for verbatim passthrough.
    pub fn vendor_status(&self) -> Option<u16> {
        match self {
            EngineError::Submission(e) | EngineError::Poll(e) => e.vendor_status(),
            _ => None,
        }
    }

    /// Structured vendor detail, when the vendor provided one.
    pub fn detail(&self) -> Option<&serde_json::Value> {
        match self {
            EngineError::VendorFailed { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }
}
