//! Artifact sink trait.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Destination for generated media that arrives as raw bytes.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Upload a finished video and return its hosted URL.
    async fn store_video(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;
}
