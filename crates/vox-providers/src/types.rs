//! Provider-independent job types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vox_models::{Orientation, VideoClip};

/// Inputs for a remote generation job, independent of the vendor wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Source still image
    pub image_url: String,
    /// Narration audio track
    pub audio_url: String,
    /// Output orientation
    pub orientation: Orientation,
    /// Optional watermark text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
}

impl RenderRequest {
    /// Build a request from a clip record.
    ///
    /// Both media references are required and must be absolute http(s) URLs;
    /// a clip that fails here cannot be submitted anywhere and the error is
    /// reported before any outbound call.
    pub fn from_clip(clip: &VideoClip) -> Result<Self, String> {
        let image_url = require_media_url(clip.image_url.as_deref(), "source image")?;
        let audio_url = require_media_url(clip.audio_url.as_deref(), "audio")?;

        Ok(Self {
            image_url,
            audio_url,
            orientation: clip.orientation,
            watermark: clip.watermark.clone(),
        })
    }
}

fn require_media_url(value: Option<&str>, what: &str) -> Result<String, String> {
    let value = value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Clip has no {} URL", what))?;

    let parsed =
        url::Url::parse(value).map_err(|_| format!("Clip {} URL is not a valid URL", what))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("Clip {} URL must be http(s)", what));
    }

    Ok(value.to_string())
}

/// Opaque vendor-assigned job identifier.
///
/// Created at submission, used for status polls, discarded once a terminal
/// state is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vendor-reported terminal failure detail.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorFailure {
    /// Human-readable message
    pub message: String,
    /// Raw vendor error payload, for diagnostics
    pub detail: Option<serde_json::Value>,
}

impl VendorFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(message: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail),
        }
    }
}

/// The finished artifact of a successful job.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderArtifact {
    /// Vendor returned a hosted result URL
    Url(String),
    /// Vendor streamed the finished video inline; the bytes still need a
    /// vault upload before a URL exists
    Bytes {
        content_type: String,
        data: Vec<u8>,
    },
}

/// Classified job status, shared across all vendors.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Job is still running
    Pending,
    /// Job finished with an artifact
    Succeeded(RenderArtifact),
    /// Vendor reported a terminal failure
    Failed(VendorFailure),
}

impl JobState {
    /// Whether further polling is meaningful.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

/// Bounds for the status-polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks
    pub interval: Duration,
    /// Maximum number of status checks before declaring a timeout
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on time spent sleeping between polls.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}
