//! Generation status handlers.
//!
//! The status endpoint is the polling surface for clients whose generate
//! request ran in the background (or who disconnected mid-wait and came
//! back after a refresh).

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use vox_models::{GenerationId, GenerationRecord};
use vox_records::RecordsError;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::sweeper::{STALE_GRACE_PERIOD_SECS, STALE_THRESHOLD_SECS};

/// Generation status response.
#[derive(Debug, Serialize)]
pub struct GenerationStatusResponse {
    #[serde(rename = "generationId")]
    pub generation_id: String,
    #[serde(rename = "clipId")]
    pub clip_id: String,
    pub provider: String,
    /// queued, running, completed, failed, timed_out (stale when the driving
    /// task stopped heartbeating)
    pub status: String,
    pub attempts: u32,
    #[serde(rename = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: String,
    pub updated_at: String,
    pub is_stale: bool,
}

impl GenerationStatusResponse {
    fn from_record(record: GenerationRecord, is_stale: bool) -> Self {
        Self {
            generation_id: record.id.to_string(),
            clip_id: record.clip_id.to_string(),
            provider: record.provider.to_string(),
            status: if is_stale {
                "stale".to_string()
            } else {
                record.status.to_string()
            },
            attempts: record.attempts,
            video_url: record.video_url,
            error: record.error,
            started_at: record.started_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
            is_stale,
        }
    }
}

async fn load_owned_generation(
    state: &AppState,
    generation_id: &str,
    user: &AuthUser,
) -> ApiResult<GenerationRecord> {
    let record = state
        .generations
        .get_generation(&GenerationId::from_string(generation_id))
        .await
        .map_err(|e| match e {
            RecordsError::NotFound(_) => ApiError::not_found("Generation not found"),
            other => ApiError::internal(other.to_string()),
        })?;

    if record.user_id != user.uid {
        return Err(ApiError::forbidden("Access denied"));
    }

    Ok(record)
}

/// GET /api/generations/:generation_id
///
/// Get the durable status of a generation.
pub async fn get_generation_status(
    State(state): State<AppState>,
    Path(generation_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<GenerationStatusResponse>> {
    let record = load_owned_generation(&state, &generation_id, &user).await?;

    let is_stale = record.is_stale(STALE_THRESHOLD_SECS, STALE_GRACE_PERIOD_SECS);

    Ok(Json(GenerationStatusResponse::from_record(record, is_stale)))
}

/// Commit response body.
#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub success: bool,
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

/// POST /api/generations/:generation_id/commit
///
/// Re-attempt the clip commit for a generation whose vendor job succeeded but
/// whose local persistence failed. Never resubmits the vendor job.
pub async fn commit_generation(
    State(state): State<AppState>,
    Path(generation_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<CommitResponse>> {
    let record = load_owned_generation(&state, &generation_id, &user).await?;

    info!(
        generation_id = %record.id,
        clip_id = %record.clip_id,
        "Re-attempting generation commit"
    );

    let video_url = state.orchestrator.commit_result(&record.id).await?;

    Ok(Json(CommitResponse {
        success: true,
        video_url,
    }))
}
