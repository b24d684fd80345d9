//! Video clip domain records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video clip record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output orientation for a generated clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait output (9:16)
    #[default]
    Vertical,
    /// Landscape output (16:9)
    Horizontal,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
        }
    }

    /// Pixel ratio string used by frame-based vendors.
    pub fn frame_ratio(&self) -> &'static str {
        match self {
            Orientation::Vertical => "768:1280",
            Orientation::Horizontal => "1280:768",
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertical" | "portrait" => Ok(Orientation::Vertical),
            "horizontal" | "landscape" => Ok(Orientation::Horizontal),
            other => Err(format!("Unknown orientation: {}", other)),
        }
    }
}

/// Lifecycle status of a clip record.
///
/// `Generating` is the in-progress guard: it is entered via an atomic
/// check-and-set before a vendor job is submitted and released on failure,
/// so at most one generation runs per clip at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    /// No generated video yet
    #[default]
    Pending,
    /// A generation is currently running for this clip
    Generating,
    /// A generated video URL has been committed
    Completed,
    /// The last generation attempt failed
    Failed,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Pending => "pending",
            ClipStatus::Generating => "generating",
            ClipStatus::Completed => "completed",
            ClipStatus::Failed => "failed",
        }
    }

    /// Whether a new generation may be started from this status.
    pub fn can_start_generation(&self) -> bool {
        matches!(self, ClipStatus::Pending | ClipStatus::Failed)
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video clip description owned by the hosted entity store.
///
/// This service reads the source media references and writes back exactly one
/// result commit (`video_url` + `Completed`) per successful generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoClip {
    /// Record ID
    pub id: ClipId,

    /// Owning user
    pub user_id: String,

    /// Display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Source still image for the generated video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Narration audio track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Output orientation
    #[serde(default)]
    pub orientation: Orientation,

    /// Optional watermark text for the output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: ClipStatus,

    /// Committed result URL (success path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoClip {
    /// Create a new clip record with the given source media.
    pub fn new(
        user_id: impl Into<String>,
        image_url: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ClipId::new(),
            user_id: user_id.into(),
            title: None,
            image_url: Some(image_url.into()),
            audio_url: Some(audio_url.into()),
            orientation: Orientation::default(),
            watermark: None,
            status: ClipStatus::Pending,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}
