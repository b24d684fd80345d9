//! API error types.
//!
//! The wire shape is `{ error, details?, status_code? }`. Vendor-side
//! failures carry the vendor's own status code through verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vox_engine::EngineError;
use vox_providers::ProviderError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Vendor rejected the job; its status code is passed through verbatim.
    #[error("Vendor error ({status}): {message}")]
    Vendor {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Vendor reported a terminal processing failure.
    #[error("{message}")]
    Processing {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Vendor { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Processing { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Carry a vendor error body as structured detail when it parses as JSON.
fn vendor_details(body: &str) -> Option<serde_json::Value> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(_) => Some(serde_json::Value::String(body.to_string())),
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Config(msg) => ApiError::Internal(msg),
            EngineError::Validation(msg) => ApiError::BadRequest(msg),
            EngineError::NotFound(msg) => ApiError::NotFound(msg),
            EngineError::AlreadyRunning(clip_id) => ApiError::Conflict(format!(
                "A generation is already running for clip {}",
                clip_id
            )),
            EngineError::Submission(ProviderError::SubmissionRejected { status, body }) => {
                ApiError::Vendor {
                    status,
                    message: "Vendor rejected the generation job".to_string(),
                    details: vendor_details(&body),
                }
            }
            EngineError::Poll(ProviderError::StatusCheck { status, body }) => ApiError::Vendor {
                status,
                message: "Vendor status check failed".to_string(),
                details: vendor_details(&body),
            },
            EngineError::Submission(other) | EngineError::Poll(other) => {
                ApiError::Internal(other.to_string())
            }
            EngineError::VendorFailed { message, detail } => ApiError::Processing {
                message: format!("Video processing failed: {}", message),
                details: detail,
            },
            EngineError::Timeout { attempts } => ApiError::Timeout(format!(
                "Video generation did not finish within {} status checks",
                attempts
            )),
            EngineError::InvalidArtifact(content_type) => ApiError::BadRequest(format!(
                "Generated file is not a video or image (content type {})",
                content_type
            )),
            EngineError::Storage(e) => ApiError::Internal(e.to_string()),
            EngineError::Persistence(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let error = match &self {
            ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            ApiError::Processing { message, .. } => message.clone(),
            ApiError::Vendor { message, .. } => message.clone(),
            _ => self.to_string(),
        };

        let (details, status_code) = match self {
            ApiError::Vendor {
                status, details, ..
            } => (details, Some(status)),
            ApiError::Processing { details, .. } => (details, None),
            _ => (None, None),
        };

        let body = ErrorResponse {
            error,
            details,
            status_code,
        };

        (status, Json(body)).into_response()
    }
}
