//! D-ID talking-head adapter.
//!
//! Submits a talk from a source image plus a narration audio track and polls
//! `/talks/{id}` until the vendor reports `done` or a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vox_models::ProviderKind;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::VideoProvider;
use crate::types::{JobHandle, JobState, PollPolicy, RenderArtifact, RenderRequest, VendorFailure};

/// Default D-ID API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.d-id.com";

/// Configuration for the D-ID adapter.
#[derive(Debug, Clone)]
pub struct DidConfig {
    /// API credential, sent as HTTP basic auth
    pub api_key: String,
    /// Base URL of the vendor API
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl DidConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// D-ID adapter.
#[derive(Debug)]
pub struct DidProvider {
    http: Client,
    config: DidConfig,
}

#[derive(Serialize)]
struct CreateTalkRequest<'a> {
    source_url: &'a str,
    script: TalkScript<'a>,
    config: TalkConfig<'a>,
}

#[derive(Serialize)]
struct TalkScript<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    audio_url: &'a str,
}

#[derive(Serialize)]
struct TalkConfig<'a> {
    result_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    watermark: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreateTalkResponse {
    id: String,
}

/// Raw talk status payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TalkStatus {
    pub status: String,
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Map a raw talk payload onto the shared state model.
///
/// Pure function of the payload: `done` succeeds, `error`/`rejected` fail,
/// everything else (`created`, `started`, unknown) stays pending.
pub fn classify_talk(payload: &TalkStatus) -> JobState {
    match payload.status.as_str() {
        "done" => match &payload.result_url {
            Some(url) => JobState::Succeeded(RenderArtifact::Url(url.clone())),
            None => JobState::Failed(VendorFailure::new("Talk finished without a result URL")),
        },
        "error" | "rejected" => {
            let message = "Vendor reported a processing failure";
            match &payload.error {
                Some(detail) => JobState::Failed(VendorFailure::with_detail(message, detail.clone())),
                None => JobState::Failed(VendorFailure::new(message)),
            }
        }
        _ => JobState::Pending,
    }
}

impl DidProvider {
    /// Create a new D-ID adapter. Fails without a credential, so a
    /// misconfigured deployment can never reach the vendor.
    pub fn new(config: DidConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingCredential("DID_API_KEY"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    fn auth(&self) -> String {
        format!("Basic {}", self.config.api_key)
    }
}

#[async_trait]
impl VideoProvider for DidProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Did
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), 60)
    }

    async fn submit(&self, request: &RenderRequest) -> ProviderResult<JobHandle> {
        let url = format!("{}/talks", self.config.base_url);

        debug!(image_url = %request.image_url, "Creating D-ID talk");

        let body = CreateTalkRequest {
            source_url: &request.image_url,
            script: TalkScript {
                kind: "audio",
                audio_url: &request.audio_url,
            },
            config: TalkConfig {
                result_format: "mp4",
                watermark: request.watermark.as_deref(),
            },
        };

        let response = self
            .http
            .post(&url)
            .header("Authorization", self.auth())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SubmissionRejected { status, body });
        }

        let created: CreateTalkResponse = response.json().await?;
        Ok(JobHandle(created.id))
    }

    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobState> {
        let url = format!("{}/talks/{}", self.config.base_url, handle);

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::StatusCheck { status, body });
        }

        let payload: TalkStatus = response.json().await?;
        Ok(classify_talk(&payload))
    }
}
