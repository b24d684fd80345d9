//! Stability AI image-to-video adapter.
//!
//! Stability is the one vendor whose "result" is the finished video itself:
//! the result endpoint answers 202 while the job runs and streams raw bytes
//! on completion, so the artifact comes back as `RenderArtifact::Bytes` and
//! needs a vault upload before a URL exists.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use vox_models::ProviderKind;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::VideoProvider;
use crate::types::{JobHandle, JobState, PollPolicy, RenderArtifact, RenderRequest, VendorFailure};

/// Default Stability API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.stability.ai";

/// Configuration for the Stability adapter.
#[derive(Debug, Clone)]
pub struct StabilityConfig {
    /// API credential, sent as a bearer token
    pub api_key: String,
    /// Base URL of the vendor API
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl StabilityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Stability AI adapter.
#[derive(Debug)]
pub struct StabilityProvider {
    http: Client,
    config: StabilityConfig,
}

#[derive(Deserialize)]
struct CreateJobResponse {
    id: String,
}

/// Map a completed (HTTP 200) result body onto the shared state model.
///
/// Pure function of content type and body: a JSON body is a vendor error
/// report, anything else is the finished media. Content-type validation of
/// the media itself is the orchestrator's job.
pub fn classify_result(content_type: &str, data: Vec<u8>) -> JobState {
    if content_type.starts_with("application/json") {
        let detail: serde_json::Value = match serde_json::from_slice(&data) {
            Ok(value) => value,
            Err(_) => {
                return JobState::Failed(VendorFailure::new(
                    "Vendor returned an unrecognized completion payload",
                ))
            }
        };

        let message = detail
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|e| e.first())
            .and_then(|e| e.as_str())
            .unwrap_or("Vendor reported a processing failure")
            .to_string();

        return JobState::Failed(VendorFailure::with_detail(message, detail));
    }

    JobState::Succeeded(RenderArtifact::Bytes {
        content_type: content_type.to_string(),
        data,
    })
}

impl StabilityProvider {
    /// Create a new Stability adapter. Fails without a credential.
    pub fn new(config: StabilityConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingCredential("STABILITY_API_KEY"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Fetch the source image; the vendor wants the binary, not a URL.
    async fn fetch_source_image(&self, image_url: &str) -> ProviderResult<(String, Vec<u8>)> {
        let response = self.http.get(image_url).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::InvalidResponse(format!(
                "Source image fetch returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        let data = response.bytes().await?.to_vec();
        Ok((content_type, data))
    }
}

#[async_trait]
impl VideoProvider for StabilityProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stability
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), 60)
    }

    async fn submit(&self, request: &RenderRequest) -> ProviderResult<JobHandle> {
        let (image_type, image_bytes) = self.fetch_source_image(&request.image_url).await?;

        let url = format!("{}/v2beta/image-to-video", self.config.base_url);

        debug!(image_url = %request.image_url, "Creating Stability job");

        let image_part = Part::bytes(image_bytes)
            .file_name("source")
            .mime_str(&image_type)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let form = Form::new()
            .part("image", image_part)
            .text("cfg_scale", "1.8")
            .text("motion_bucket_id", "127");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SubmissionRejected { status, body });
        }

        let created: CreateJobResponse = response.json().await?;
        Ok(JobHandle(created.id))
    }

    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobState> {
        let url = format!(
            "{}/v2beta/image-to-video/result/{}",
            self.config.base_url, handle
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, "video/*")
            .send()
            .await?;

        // 202 means the job is still running
        if response.status() == StatusCode::ACCEPTED {
            return Ok(JobState::Pending);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::StatusCheck { status, body });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = response.bytes().await?.to_vec();
        Ok(classify_result(&content_type, data))
    }
}
