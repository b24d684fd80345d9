//! Clip record handlers.

use axum::extract::{Path, State};
use axum::Json;

use vox_models::{ClipId, VideoClip};
use vox_records::RecordsError;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Load a clip and verify the caller owns it.
///
/// Another user's clip reads as missing, so record IDs cannot be probed.
pub(crate) async fn load_owned_clip(
    state: &AppState,
    clip_id: &ClipId,
    user: &AuthUser,
) -> ApiResult<VideoClip> {
    let clip = state.clips.get_clip(clip_id).await.map_err(|e| match e {
        RecordsError::NotFound(_) => ApiError::not_found("Video clip not found"),
        other => ApiError::internal(other.to_string()),
    })?;

    if clip.user_id != user.uid {
        return Err(ApiError::not_found("Video clip not found"));
    }

    Ok(clip)
}

/// GET /api/clips/:clip_id
///
/// Fetch a clip record.
pub async fn get_clip(
    State(state): State<AppState>,
    Path(clip_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<VideoClip>> {
    let clip = load_owned_clip(&state, &ClipId::from_string(&clip_id), &user).await?;
    Ok(Json(clip))
}
