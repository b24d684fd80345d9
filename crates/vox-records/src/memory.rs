//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use vox_models::{ClipId, ClipStatus, GenerationId, GenerationRecord, VideoClip};

use crate::error::{RecordsError, RecordsResult};
use crate::store::{ClipStore, GenerationStore};

/// In-memory implementation of the record stores.
///
/// The guard check-and-set runs under one write lock, so it gives the same
/// atomicity the hosted store's conditional update does.
#[derive(Clone, Default)]
pub struct MemoryStore {
    clips: Arc<RwLock<HashMap<String, VideoClip>>>,
    generations: Arc<RwLock<HashMap<String, GenerationRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a clip record.
    pub async fn insert_clip(&self, clip: VideoClip) {
        self.clips.write().await.insert(clip.id.as_str().to_string(), clip);
    }

    /// Snapshot a clip record (test helper).
    pub async fn clip(&self, id: &ClipId) -> Option<VideoClip> {
        self.clips.read().await.get(id.as_str()).cloned()
    }
}

#[async_trait]
impl ClipStore for MemoryStore {
    async fn get_clip(&self, id: &ClipId) -> RecordsResult<VideoClip> {
        self.clips
            .read()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| RecordsError::not_found(id.as_str()))
    }

    async fn begin_generation(&self, id: &ClipId) -> RecordsResult<()> {
        let mut clips = self.clips.write().await;
        let clip = clips
            .get_mut(id.as_str())
            .ok_or_else(|| RecordsError::not_found(id.as_str()))?;

        if !clip.status.can_start_generation() {
            return Err(RecordsError::conflict(format!(
                "clip {} is {}",
                id, clip.status
            )));
        }

        clip.status = ClipStatus::Generating;
        clip.updated_at = Utc::now();
        Ok(())
    }

    async fn complete_generation(&self, id: &ClipId, video_url: &str) -> RecordsResult<()> {
        let mut clips = self.clips.write().await;
        let clip = clips
            .get_mut(id.as_str())
            .ok_or_else(|| RecordsError::not_found(id.as_str()))?;

        clip.video_url = Some(video_url.to_string());
        clip.status = ClipStatus::Completed;
        clip.updated_at = Utc::now();
        Ok(())
    }

    async fn release_generation(&self, id: &ClipId) -> RecordsResult<()> {
        let mut clips = self.clips.write().await;
        let clip = clips
            .get_mut(id.as_str())
            .ok_or_else(|| RecordsError::not_found(id.as_str()))?;

        if clip.status == ClipStatus::Generating {
            clip.status = ClipStatus::Failed;
            clip.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn create_generation(&self, record: &GenerationRecord) -> RecordsResult<()> {
        self.generations
            .write()
            .await
            .insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    async fn get_generation(&self, id: &GenerationId) -> RecordsResult<GenerationRecord> {
        self.generations
            .read()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| RecordsError::not_found(id.as_str()))
    }

    async fn update_generation(&self, record: &GenerationRecord) -> RecordsResult<()> {
        let mut generations = self.generations.write().await;
        if !generations.contains_key(record.id.as_str()) {
            return Err(RecordsError::not_found(record.id.as_str()));
        }
        generations.insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    async fn list_active_generations(&self) -> RecordsResult<Vec<GenerationRecord>> {
        Ok(self
            .generations
            .read()
            .await
            .values()
            .filter(|g| !g.is_terminal())
            .cloned()
            .collect())
    }
}
