//! HTTP client for the platform records service.
//!
//! Thin REST client with a service-key credential, typed error mapping and
//! retry on transient failures. Status transitions are delegated to the
//! store's conditional-update endpoint so the check-and-set is atomic on the
//! server side.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use vox_models::{ClipId, ClipStatus, GenerationId, GenerationRecord, VideoClip};

use crate::error::{RecordsError, RecordsResult};
use crate::retry::{with_retry, RetryConfig};
use crate::store::{ClipStore, GenerationStore};

/// Records client configuration.
#[derive(Debug, Clone)]
pub struct RecordsConfig {
    /// Base URL of the records service
    pub base_url: String,
    /// Service credential sent as a bearer token
    pub service_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl RecordsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> RecordsResult<Self> {
        let base_url = std::env::var("RECORDS_API_URL")
            .map_err(|_| RecordsError::auth_error("RECORDS_API_URL not set"))?;
        let service_key = std::env::var("RECORDS_API_KEY")
            .map_err(|_| RecordsError::auth_error("RECORDS_API_KEY not set"))?;

        if service_key.is_empty() {
            return Err(RecordsError::auth_error("RECORDS_API_KEY cannot be empty"));
        }

        let connect_timeout_secs: u64 = std::env::var("RECORDS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }
}

/// HTTP client for the records service.
#[derive(Clone)]
pub struct RecordsClient {
    http: Client,
    config: RecordsConfig,
}

/// Body for the conditional status-transition endpoint.
#[derive(Serialize)]
struct TransitionRequest<'a> {
    from: &'a [ClipStatus],
    to: ClipStatus,
}

/// Body for the result commit.
#[derive(Serialize)]
struct CommitRequest<'a> {
    video_url: &'a str,
    status: ClipStatus,
}

impl RecordsClient {
    /// Create a new records client.
    pub fn new(config: RecordsConfig) -> RecordsResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(RecordsError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> RecordsResult<Self> {
        Self::new(RecordsConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Map a non-success response to a typed error.
    async fn error_for(&self, response: Response) -> RecordsError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => RecordsError::not_found(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RecordsError::auth_error(body),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => RecordsError::conflict(body),
            StatusCode::TOO_MANY_REQUESTS => {
                RecordsError::RateLimited(retry_after.unwrap_or(1000))
            }
            s if s.is_server_error() => {
                RecordsError::Unavailable(format!("{}: {}", s, body))
            }
            s => RecordsError::request_failed(format!("{}: {}", s, body)),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> RecordsResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.config.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(response).await);
        }

        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> RecordsResult<()> {
        let response = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&self.config.service_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_for(response).await);
        }

        Ok(())
    }
}

#[async_trait]
impl ClipStore for RecordsClient {
    async fn get_clip(&self, id: &ClipId) -> RecordsResult<VideoClip> {
        let path = format!("/clips/{}", id);
        with_retry(&self.config.retry, "get_clip", || self.get_json(&path)).await
    }

    async fn begin_generation(&self, id: &ClipId) -> RecordsResult<()> {
        debug!(clip_id = %id, "Acquiring generation guard");

        // Not retried: a lost response followed by a retry would read as a
        // conflict with our own transition.
        self.send_json(
            reqwest::Method::POST,
            &format!("/clips/{}/transition", id),
            &TransitionRequest {
                from: &[ClipStatus::Pending, ClipStatus::Failed],
                to: ClipStatus::Generating,
            },
        )
        .await
    }

    async fn complete_generation(&self, id: &ClipId, video_url: &str) -> RecordsResult<()> {
        let path = format!("/clips/{}", id);
        let body = CommitRequest {
            video_url,
            status: ClipStatus::Completed,
        };

        // Idempotent: committing the same URL twice converges on one state.
        with_retry(&self.config.retry, "complete_generation", || {
            self.send_json(reqwest::Method::PATCH, &path, &body)
        })
        .await
    }

    async fn release_generation(&self, id: &ClipId) -> RecordsResult<()> {
        debug!(clip_id = %id, "Releasing generation guard");

        self.send_json(
            reqwest::Method::POST,
            &format!("/clips/{}/transition", id),
            &TransitionRequest {
                from: &[ClipStatus::Generating],
                to: ClipStatus::Failed,
            },
        )
        .await
    }
}

#[async_trait]
impl GenerationStore for RecordsClient {
    async fn create_generation(&self, record: &GenerationRecord) -> RecordsResult<()> {
        self.send_json(reqwest::Method::POST, "/generations", record)
            .await
    }

    async fn get_generation(&self, id: &GenerationId) -> RecordsResult<GenerationRecord> {
        let path = format!("/generations/{}", id);
        with_retry(&self.config.retry, "get_generation", || self.get_json(&path)).await
    }

    async fn update_generation(&self, record: &GenerationRecord) -> RecordsResult<()> {
        let path = format!("/generations/{}", record.id);
        with_retry(&self.config.retry, "update_generation", || {
            self.send_json(reqwest::Method::PUT, &path, record)
        })
        .await
    }

    async fn list_active_generations(&self) -> RecordsResult<Vec<GenerationRecord>> {
        with_retry(&self.config.retry, "list_active_generations", || {
            self.get_json("/generations?active=true")
        })
        .await
    }
}
