//! Runway ML image-to-video adapter.
//!
//! Runway jobs run noticeably longer than the other vendors, so this adapter
//! carries a 10-minute polling ceiling instead of 5.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vox_models::ProviderKind;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::VideoProvider;
use crate::types::{JobHandle, JobState, PollPolicy, RenderArtifact, RenderRequest, VendorFailure};

/// Default Runway API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.dev.runwayml.com";

/// API version header required by the vendor.
const API_VERSION: &str = "2024-11-06";

/// Generation model.
const MODEL: &str = "gen3a_turbo";

/// Configuration for the Runway adapter.
#[derive(Debug, Clone)]
pub struct RunwayConfig {
    /// API credential, sent as a bearer token
    pub api_key: String,
    /// Base URL of the vendor API
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RunwayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Runway ML adapter.
#[derive(Debug)]
pub struct RunwayProvider {
    http: Client,
    config: RunwayConfig,
}

#[derive(Serialize)]
struct CreateTaskRequest<'a> {
    #[serde(rename = "promptImage")]
    prompt_image: &'a str,
    model: &'static str,
    ratio: &'static str,
    duration: u32,
}

#[derive(Deserialize)]
struct CreateTaskResponse {
    id: String,
}

/// Raw task status payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default)]
    pub output: Option<Vec<String>>,
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default, rename = "failureCode")]
    pub failure_code: Option<String>,
}

/// Map a raw task payload onto the shared state model.
///
/// Pure function of the payload: `SUCCEEDED` succeeds with the first output,
/// `FAILED`/`CANCELLED` fail, everything else (`PENDING`, `RUNNING`,
/// `THROTTLED`, unknown) stays pending.
pub fn classify_task(payload: &TaskStatus) -> JobState {
    match payload.status.as_str() {
        "SUCCEEDED" => match payload.output.as_ref().and_then(|o| o.first()) {
            Some(url) => JobState::Succeeded(RenderArtifact::Url(url.clone())),
            None => JobState::Failed(VendorFailure::new("Task succeeded without an output URL")),
        },
        "FAILED" | "CANCELLED" => {
            let message = payload
                .failure
                .clone()
                .unwrap_or_else(|| "Vendor reported a processing failure".to_string());
            let detail = serde_json::json!({
                "failure": payload.failure,
                "failureCode": payload.failure_code,
            });
            JobState::Failed(VendorFailure::with_detail(message, detail))
        }
        _ => JobState::Pending,
    }
}

impl RunwayProvider {
    /// Create a new Runway adapter. Fails without a credential.
    pub fn new(config: RunwayConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingCredential("RUNWAY_API_KEY"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl VideoProvider for RunwayProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Runway
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), 120)
    }

    async fn submit(&self, request: &RenderRequest) -> ProviderResult<JobHandle> {
        let url = format!("{}/v1/image_to_video", self.config.base_url);

        debug!(image_url = %request.image_url, "Creating Runway task");

        let body = CreateTaskRequest {
            prompt_image: &request.image_url,
            model: MODEL,
            ratio: request.orientation.frame_ratio(),
            duration: 5,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-Runway-Version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SubmissionRejected { status, body });
        }

        let created: CreateTaskResponse = response.json().await?;
        Ok(JobHandle(created.id))
    }

    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobState> {
        let url = format!("{}/v1/tasks/{}", self.config.base_url, handle);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-Runway-Version", API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::StatusCheck { status, body });
        }

        let payload: TaskStatus = response.json().await?;
        Ok(classify_task(&payload))
    }
}
