//! Persistence traits for clip and generation records.

use async_trait::async_trait;

use vox_models::{ClipId, GenerationId, GenerationRecord, VideoClip};

use crate::error::RecordsResult;

/// Access to video clip records.
///
/// The result commit (`complete_generation`) is the only write of the result
/// fields and runs at most once per generation, on the success path only.
#[async_trait]
pub trait ClipStore: Send + Sync {
    /// Fetch a clip record by ID.
    async fn get_clip(&self, id: &ClipId) -> RecordsResult<VideoClip>;

    /// Atomically move the clip into `Generating`.
    ///
    /// Succeeds only from `Pending` or `Failed`; any other current status is
    /// a `Conflict`. This is the in-progress guard that keeps two concurrent
    /// requests from launching duplicate vendor jobs for one record.
    async fn begin_generation(&self, id: &ClipId) -> RecordsResult<()>;

    /// Commit the generated artifact: set `video_url` and `Completed`.
    async fn complete_generation(&self, id: &ClipId, video_url: &str) -> RecordsResult<()>;

    /// Release the in-progress guard after a failed or timed-out generation
    /// (`Generating` -> `Failed`). The result fields are not touched.
    async fn release_generation(&self, id: &ClipId) -> RecordsResult<()>;
}

/// Access to the durable generation records.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Create a new generation record.
    async fn create_generation(&self, record: &GenerationRecord) -> RecordsResult<()>;

    /// Fetch a generation record by ID.
    async fn get_generation(&self, id: &GenerationId) -> RecordsResult<GenerationRecord>;

    /// Replace a generation record.
    async fn update_generation(&self, record: &GenerationRecord) -> RecordsResult<()>;

    /// List generations that are not yet terminal.
    async fn list_active_generations(&self) -> RecordsResult<Vec<GenerationRecord>>;
}
