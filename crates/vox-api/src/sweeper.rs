//! Background recovery of stale generations.
//!
//! A generation is driven by an in-process task; if that task dies (deploy,
//! crash, OOM) the vendor job keeps running but nobody observes it, and the
//! clip would sit in `Generating` forever. This sweeper scans active
//! generation records, marks heartbeat-silent ones failed and releases the
//! clip guard so the record can be retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use vox_records::{ClipStore, GenerationStore};

use crate::metrics;

/// Seconds without a heartbeat before a running generation counts as stale.
/// Heartbeats land once per poll attempt (every ~5s), so this is generous.
pub const STALE_THRESHOLD_SECS: i64 = 60;

/// Grace period for generations that never heartbeat (task died before the
/// first poll).
pub const STALE_GRACE_PERIOD_SECS: i64 = 120;

/// Interval between sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Stale generation sweeper.
pub struct StaleGenerationSweeper {
    generations: Arc<dyn GenerationStore>,
    clips: Arc<dyn ClipStore>,
    enabled: bool,
}

impl StaleGenerationSweeper {
    /// Create a new sweeper.
    pub fn new(generations: Arc<dyn GenerationStore>, clips: Arc<dyn ClipStore>) -> Self {
        let enabled = std::env::var("ENABLE_STALE_SWEEPER")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            generations,
            clips,
            enabled,
        }
    }

    /// Run the sweep loop. Spawn as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Stale generation sweeper is disabled");
            return;
        }

        info!("Starting stale generation sweeper (interval: {:?})", SWEEP_INTERVAL);

        let mut ticker = interval(SWEEP_INTERVAL);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep().await {
                error!("Stale generation sweep error: {}", e);
            }
        }
    }

    /// Run a single sweep cycle. Returns (stale, recovered) counts.
    pub async fn sweep(&self) -> anyhow::Result<(u32, u32)> {
        let active = self.generations.list_active_generations().await?;

        if active.is_empty() {
            return Ok((0, 0));
        }

        let mut stale_count = 0u32;
        let mut recovered_count = 0u32;

        for record in active {
            if !record.is_stale(STALE_THRESHOLD_SECS, STALE_GRACE_PERIOD_SECS) {
                continue;
            }

            stale_count += 1;

            warn!(
                generation_id = %record.id,
                clip_id = %record.clip_id,
                last_heartbeat = ?record.last_heartbeat,
                started_at = %record.started_at,
                "Detected stale generation (no heartbeat)"
            );

            let mut record = record;
            record.fail("Generation task stopped responding. Please try again.");

            if let Err(e) = self.generations.update_generation(&record).await {
                error!(
                    generation_id = %record.id,
                    "Failed to mark stale generation failed: {}",
                    e
                );
                continue;
            }

            // Release the clip guard so the record isn't stranded in
            // Generating. Best-effort: the clip may already have moved on.
            if let Err(e) = self.clips.release_generation(&record.clip_id).await {
                warn!(
                    clip_id = %record.clip_id,
                    "Failed to release guard for stale generation: {}",
                    e
                );
            }

            metrics::record_stale_generation();
            recovered_count += 1;
            info!(
                generation_id = %record.id,
                clip_id = %record.clip_id,
                "Recovered stale generation"
            );
        }

        if stale_count > 0 {
            info!(
                "Stale generation sweep complete: {} stale, {} recovered",
                stale_count, recovered_count
            );
        }

        Ok((stale_count, recovered_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use vox_models::{ClipStatus, GenerationRecord, GenerationStatus, ProviderKind, VideoClip};
    use vox_records::MemoryStore;

    #[tokio::test]
    async fn test_sweep_recovers_heartbeat_silent_generation() {
        let store = MemoryStore::new();
        let clip = VideoClip::new("user-1", "https://cdn/img.png", "https://cdn/voice.mp3");
        let clip_id = clip.id.clone();
        store.insert_clip(clip).await;
        store.begin_generation(&clip_id).await.unwrap();

        let mut record = GenerationRecord::new(clip_id.clone(), "user-1", ProviderKind::Did);
        record.mark_running();
        // Task died long ago, no heartbeat was ever recorded
        record.started_at = chrono::Utc::now() - chrono::Duration::seconds(600);
        store.create_generation(&record).await.unwrap();

        let sweeper = StaleGenerationSweeper::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        let (stale, recovered) = sweeper.sweep().await.unwrap();

        assert_eq!((stale, recovered), (1, 1));

        let record = store.get_generation(&record.id).await.unwrap();
        assert_eq!(record.status, GenerationStatus::Failed);

        let clip = store.clip(&clip_id).await.unwrap();
        assert_eq!(clip.status, ClipStatus::Failed);
    }

    #[tokio::test]
    async fn test_sweep_ignores_healthy_generations() {
        let store = MemoryStore::new();

        let mut record = GenerationRecord::new(
            vox_models::ClipId::from_string("clip-1"),
            "user-1",
            ProviderKind::Runway,
        );
        record.mark_running();
        record.record_heartbeat(3);
        store.create_generation(&record).await.unwrap();

        let sweeper = StaleGenerationSweeper::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        let (stale, recovered) = sweeper.sweep().await.unwrap();

        assert_eq!((stale, recovered), (0, 0));

        let record = store.get_generation(&record.id).await.unwrap();
        assert_eq!(record.status, GenerationStatus::Running);
    }
}
