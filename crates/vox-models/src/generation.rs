//! Generation records for the durable job-status store.
//!
//! A generation record outlives the task that drives it, so a client that
//! disconnects mid-generation can still recover the outcome by polling the
//! status endpoint, and a crashed task can be detected by heartbeat.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::clip::ClipId;
use crate::provider::ProviderKind;

/// Unique identifier for a generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GenerationId(pub String);

impl GenerationId {
    /// Generate a new random generation ID.
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

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Created, task not yet running
    #[default]
    Queued,
    /// Submitted to the vendor, polling for completion
    Running,
    /// Artifact committed to the clip record
    Completed,
    /// Vendor reported failure, or an internal step failed
    Failed,
    /// Attempt budget exhausted while the vendor job was still pending
    TimedOut,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Queued => "queued",
            GenerationStatus::Running => "running",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
            GenerationStatus::TimedOut => "timed_out",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed | GenerationStatus::Failed | GenerationStatus::TimedOut
        )
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A durable record of one generation attempt.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRecord {
    /// Unique generation ID
    pub id: GenerationId,

    /// Clip this generation targets
    pub clip_id: ClipId,

    /// Owning user
    pub user_id: String,

    /// Vendor the job was submitted to
    pub provider: ProviderKind,

    /// Current status
    #[serde(default)]
    pub status: GenerationStatus,

    /// Number of status polls performed so far
    #[serde(default)]
    pub attempts: u32,

    /// Result URL once the vendor job succeeded.
    ///
    /// Set before the clip commit is attempted, so a failed commit can be
    /// re-run without resubmitting the vendor job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Whether the result URL has been committed to the clip record
    #[serde(default)]
    pub committed: bool,

    /// Error detail (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the generation was created
    pub started_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,

    /// Last heartbeat from the driving task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl GenerationRecord {
    /// Create a new queued generation record.
    pub fn new(clip_id: ClipId, user_id: impl Into<String>, provider: ProviderKind) -> Self {
        let now = Utc::now();
        Self {
            id: GenerationId::new(),
            clip_id,
            user_id: user_id.into(),
            provider,
            status: GenerationStatus::Queued,
            attempts: 0,
            video_url: None,
            committed: false,
            error: None,
            started_at: now,
            updated_at: now,
            last_heartbeat: None,
        }
    }

    /// Check if the generation is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark as running (vendor job submitted).
    pub fn mark_running(&mut self) {
        self.status = GenerationStatus::Running;
        self.updated_at = Utc::now();
    }

    /// Record a poll heartbeat.
    pub fn record_heartbeat(&mut self, attempts: u32) {
        self.attempts = attempts;
        self.last_heartbeat = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Record the vendor artifact URL ahead of the clip commit.
    pub fn set_artifact(&mut self, video_url: impl Into<String>) {
        self.video_url = Some(video_url.into());
        self.updated_at = Utc::now();
    }

    /// Mark as completed with the committed result URL.
    pub fn complete(&mut self, video_url: impl Into<String>) {
        self.status = GenerationStatus::Completed;
        self.video_url = Some(video_url.into());
        self.committed = true;
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Mark as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = GenerationStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Mark as timed out after exhausting the attempt budget.
    pub fn time_out(&mut self, attempts: u32) {
        self.status = GenerationStatus::TimedOut;
        self.attempts = attempts;
        self.error = Some("Vendor job did not finish within the polling budget".into());
        self.updated_at = Utc::now();
    }

    /// Check if the generation should be considered stale.
    ///
    /// A generation is stale if it is not terminal and either no heartbeat was
    /// ever recorded and it is older than `grace_period_secs`, or the last
    /// heartbeat is older than `stale_threshold_secs`.
    pub fn is_stale(&self, stale_threshold_secs: i64, grace_period_secs: i64) -> bool {
        if self.is_terminal() {
            return false;
        }

        let now = Utc::now();
        match self.last_heartbeat {
            Some(hb) => (now - hb).num_seconds() > stale_threshold_secs,
            None => (now - self.started_at).num_seconds() > grace_period_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> GenerationRecord {
        GenerationRecord::new(ClipId::from_string("clip-1"), "user-1", ProviderKind::Did)
    }

    #[test]
    fn test_generation_record_creation() {
        let gen = record();
        assert_eq!(gen.status, GenerationStatus::Queued);
        assert_eq!(gen.attempts, 0);
        assert!(!gen.is_terminal());
        assert!(!gen.committed);
    }

    #[test]
    fn test_generation_transitions() {
        let mut gen = record();

        gen.mark_running();
        assert_eq!(gen.status, GenerationStatus::Running);

        gen.record_heartbeat(3);
        assert_eq!(gen.attempts, 3);
        assert!(gen.last_heartbeat.is_some());

        gen.complete("https://cdn/video.mp4");
        assert_eq!(gen.status, GenerationStatus::Completed);
        assert!(gen.committed);
        assert!(gen.is_terminal());
    }

    #[test]
    fn test_artifact_survives_failed_commit() {
        let mut gen = record();
        gen.mark_running();
        gen.set_artifact("https://cdn/video.mp4");
        gen.fail("entity store unavailable");

        assert_eq!(gen.status, GenerationStatus::Failed);
        assert_eq!(gen.video_url.as_deref(), Some("https://cdn/video.mp4"));
        assert!(!gen.committed);
    }

    #[test]
    fn test_timeout_is_distinct_from_failure() {
        let mut gen = record();
        gen.mark_running();
        gen.time_out(60);

        assert_eq!(gen.status, GenerationStatus::TimedOut);
        assert_eq!(gen.attempts, 60);
        assert!(gen.is_terminal());
    }

    #[test]
    fn test_stale_detection() {
        let mut gen = record();
        gen.mark_running();

        // Within grace period, not stale
        assert!(!gen.is_stale(60, 120));

        // Old record without heartbeat
        gen.started_at = Utc::now() - chrono::Duration::seconds(200);
        assert!(gen.is_stale(60, 120));

        // Recent heartbeat resets staleness
        gen.record_heartbeat(1);
        assert!(!gen.is_stale(60, 120));

        // Terminal records are never stale
        gen.complete("https://cdn/video.mp4");
        assert!(!gen.is_stale(60, 120));
    }
}
