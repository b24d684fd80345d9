//! Generation lifecycle orchestration.

use std::sync::Arc;

use tracing::{error, info};

use vox_models::{ClipId, GenerationId, GenerationRecord, ProviderKind, VideoClip};
use vox_providers::{ProviderRegistry, RenderArtifact, RenderRequest, VideoProvider};
use vox_records::{ClipStore, GenerationStore, RecordsError};
use vox_storage::ArtifactSink;

use crate::error::{EngineError, EngineResult};
use crate::poll::poll_until_terminal;

/// Drives a generation from submission to the committed result.
pub struct Orchestrator {
    clips: Arc<dyn ClipStore>,
    generations: Arc<dyn GenerationStore>,
    vault: Arc<dyn ArtifactSink>,
    providers: Arc<ProviderRegistry>,
}

impl Orchestrator {
    pub fn new(
        clips: Arc<dyn ClipStore>,
        generations: Arc<dyn GenerationStore>,
        vault: Arc<dyn ArtifactSink>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            clips,
            generations,
            vault,
            providers,
        }
    }

    /// Create the durable record for a new generation attempt.
    pub async fn create_generation(
        &self,
        clip_id: ClipId,
        user_id: impl Into<String>,
        provider: ProviderKind,
    ) -> EngineResult<GenerationRecord> {
        let record = GenerationRecord::new(clip_id, user_id, provider);
        self.generations
            .create_generation(&record)
            .await
            .map_err(EngineError::persistence)?;
        Ok(record)
    }

    /// Run one generation to its terminal state and return the committed
    /// video URL.
    ///
    /// The durable record always ends terminal: `Completed` on success,
    /// `TimedOut` when the attempt budget runs out, `Failed` otherwise.
    pub async fn run(&self, generation_id: &GenerationId) -> EngineResult<String> {
        let mut generation = self
            .generations
            .get_generation(generation_id)
            .await
            .map_err(|e| match e {
                RecordsError::NotFound(_) => {
                    EngineError::NotFound(format!("Generation {} not found", generation_id))
                }
                other => EngineError::persistence(other),
            })?;

        match self.drive(&mut generation).await {
            Ok(video_url) => {
                generation.complete(video_url.clone());
                self.save(&generation).await;
                info!(
                    generation_id = %generation.id,
                    clip_id = %generation.clip_id,
                    provider = %generation.provider,
                    "Generation completed"
                );
                Ok(video_url)
            }
            Err(e) => {
                match &e {
                    EngineError::Timeout { attempts } => generation.time_out(*attempts),
                    other => generation.fail(other.to_string()),
                }
                self.save(&generation).await;
                Err(e)
            }
        }
    }

    /// Everything between the loaded record and the committed result.
    async fn drive(&self, generation: &mut GenerationRecord) -> EngineResult<String> {
        let clip = self.load_clip(&generation.clip_id).await?;
        let request = RenderRequest::from_clip(&clip).map_err(EngineError::Validation)?;

        // Resolved before any mutation, so a missing credential fails with
        // the clip untouched and zero outbound calls.
        let provider = self
            .providers
            .get(generation.provider)
            .map_err(|e| EngineError::Config(e.to_string()))?;

        // In-progress guard: atomically flip the clip into Generating.
        self.clips
            .begin_generation(&generation.clip_id)
            .await
            .map_err(|e| match e {
                RecordsError::Conflict(_) => {
                    EngineError::AlreadyRunning(generation.clip_id.to_string())
                }
                RecordsError::NotFound(_) => {
                    EngineError::NotFound(format!("Video clip {} not found", generation.clip_id))
                }
                other => EngineError::persistence(other),
            })?;

        generation.mark_running();
        self.save(generation).await;

        match self
            .submit_and_commit(generation, &request, provider.as_ref())
            .await
        {
            Ok(video_url) => Ok(video_url),
            Err(e) => {
                // Release the guard so the clip can be retried. The result
                // fields are never written on this path.
                if let Err(release_err) = self.clips.release_generation(&generation.clip_id).await
                {
                    error!(
                        clip_id = %generation.clip_id,
                        "Failed to release generation guard: {}",
                        release_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn submit_and_commit(
        &self,
        generation: &mut GenerationRecord,
        request: &RenderRequest,
        provider: &dyn VideoProvider,
    ) -> EngineResult<String> {
        info!(
            generation_id = %generation.id,
            clip_id = %generation.clip_id,
            provider = %provider.kind(),
            "Submitting generation job"
        );

        let handle = provider
            .submit(request)
            .await
            .map_err(EngineError::Submission)?;

        let policy = provider.poll_policy();
        let generations = Arc::clone(&self.generations);
        let generation_id = generation.id.clone();

        let poll_result = poll_until_terminal(provider, &handle, &policy, |attempt| {
            let generations = Arc::clone(&generations);
            let generation_id = generation_id.clone();
            async move {
                // Heartbeats are best-effort; losing one must not kill the job
                if let Ok(mut record) = generations.get_generation(&generation_id).await {
                    record.record_heartbeat(attempt);
                    generations.update_generation(&record).await.ok();
                }
            }
        })
        .await;

        // Heartbeats landed on the store copy; sync them into the local copy
        // so the terminal save does not roll the attempt count back.
        if let Ok(latest) = self.generations.get_generation(&generation.id).await {
            generation.attempts = latest.attempts;
            generation.last_heartbeat = latest.last_heartbeat;
        }

        let artifact = poll_result?;

        let video_url = self
            .resolve_artifact(&generation.clip_id, &generation.id, artifact)
            .await?;

        // Keep the artifact URL on the durable record ahead of the commit, so
        // a failed commit can be re-run without resubmitting the vendor job.
        generation.set_artifact(video_url.clone());
        self.save(generation).await;

        self.clips
            .complete_generation(&generation.clip_id, &video_url)
            .await
            .map_err(EngineError::persistence)?;

        Ok(video_url)
    }

    /// Turn the poll outcome into a hosted URL.
    async fn resolve_artifact(
        &self,
        clip_id: &ClipId,
        generation_id: &GenerationId,
        artifact: RenderArtifact,
    ) -> EngineResult<String> {
        match artifact {
            RenderArtifact::Url(url) => Ok(url),
            RenderArtifact::Bytes { content_type, data } => {
                if !content_type.starts_with("video/") && !content_type.starts_with("image/") {
                    return Err(EngineError::InvalidArtifact(content_type));
                }

                let extension = content_type
                    .split('/')
                    .nth(1)
                    .map(|s| s.split(';').next().unwrap_or(s).trim())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("mp4");
                let key = format!("clips/{}/{}.{}", clip_id, generation_id, extension);

                let url = self.vault.store_video(&key, &content_type, data).await?;
                Ok(url)
            }
        }
    }

    /// Re-attempt the clip commit for a generation whose vendor job succeeded
    /// but whose local commit failed. Never resubmits the vendor job.
    pub async fn commit_result(&self, generation_id: &GenerationId) -> EngineResult<String> {
        let mut generation = self
            .generations
            .get_generation(generation_id)
            .await
            .map_err(|e| match e {
                RecordsError::NotFound(_) => {
                    EngineError::NotFound(format!("Generation {} not found", generation_id))
                }
                other => EngineError::persistence(other),
            })?;

        let video_url = generation.video_url.clone().ok_or_else(|| {
            EngineError::Validation("Generation has no artifact to commit".to_string())
        })?;

        if generation.committed {
            return Ok(video_url);
        }

        self.clips
            .complete_generation(&generation.clip_id, &video_url)
            .await
            .map_err(EngineError::persistence)?;

        generation.complete(video_url.clone());
        self.save(&generation).await;

        Ok(video_url)
    }

    async fn load_clip(&self, clip_id: &ClipId) -> EngineResult<VideoClip> {
        self.clips.get_clip(clip_id).await.map_err(|e| match e {
            RecordsError::NotFound(_) => {
                EngineError::NotFound(format!("Video clip {} not found", clip_id))
            }
            other => EngineError::persistence(other),
        })
    }

    /// Best-effort durable-record update.
    async fn save(&self, generation: &GenerationRecord) {
        if let Err(e) = self.generations.update_generation(generation).await {
            error!(
                generation_id = %generation.id,
                "Failed to update generation record: {}",
                e
            );
        }
    }
}
