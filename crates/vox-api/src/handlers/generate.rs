//! Generation submission handlers.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vox_engine::EngineError;
use vox_models::{ClipId, GenerationId, ProviderKind};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::clips::load_owned_clip;
use crate::metrics;
use crate::state::AppState;

/// Generation request body.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Target clip record
    #[serde(rename = "videoClipId")]
    pub video_clip_id: Option<String>,
    /// Block until the generation reaches a terminal state instead of
    /// returning 202 with a status URL
    #[serde(default)]
    pub wait: bool,
}

/// Generation response body.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(rename = "videoUrl", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(rename = "generationId", skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    #[serde(rename = "statusUrl", skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerateResponse {
    fn completed(video_url: String) -> Self {
        Self {
            success: true,
            video_url: Some(video_url),
            generation_id: None,
            status_url: None,
            message: Some("Video generated successfully".to_string()),
        }
    }

    fn accepted(generation_id: &GenerationId) -> Self {
        Self {
            success: true,
            video_url: None,
            generation_id: Some(generation_id.to_string()),
            status_url: Some(format!("/api/generations/{}", generation_id)),
            message: Some("Video generation started".to_string()),
        }
    }
}

/// POST /api/generate/:provider
///
/// Start a generation for a clip. The default mode creates a durable
/// generation record, spawns the orchestration task and responds 202; with
/// `wait: true` the handler blocks until the terminal outcome and answers
/// with the synchronous contract (200 on success, 408 on timeout, the error
/// mapping otherwise).
pub async fn generate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    user: AuthUser,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let provider: ProviderKind = provider
        .parse()
        .map_err(|e: String| ApiError::bad_request(e))?;

    let clip_id = body
        .video_clip_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing videoClipId"))?;

    // Credential gating: fail before anything leaves the process
    state
        .providers
        .get(provider)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let clip = load_owned_clip(&state, &ClipId::from_string(&clip_id), &user).await?;

    let generation = state
        .orchestrator
        .create_generation(clip.id.clone(), &user.uid, provider)
        .await?;

    info!(
        generation_id = %generation.id,
        clip_id = %clip.id,
        provider = %provider,
        uid = %user.uid,
        wait = body.wait,
        "Generation requested"
    );

    if body.wait {
        let started = Instant::now();
        let result = state.orchestrator.run(&generation.id).await;
        finish_metrics(&state, &generation.id, provider, &result, started).await;

        let video_url = result?;
        Ok((StatusCode::OK, Json(GenerateResponse::completed(video_url))))
    } else {
        let orchestrator = state.orchestrator.clone();
        let generations = state.generations.clone();
        let generation_id = generation.id.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let result = orchestrator.run(&generation_id).await;

            let attempts = generations
                .get_generation(&generation_id)
                .await
                .map(|g| g.attempts)
                .unwrap_or(0);
            metrics::record_generation(
                provider.as_str(),
                outcome_label(&result),
                started.elapsed().as_secs_f64(),
                attempts,
            );

            if let Err(e) = result {
                warn!(
                    generation_id = %generation_id,
                    provider = %provider,
                    "Generation failed: {}",
                    e
                );
            }
        });

        Ok((
            StatusCode::ACCEPTED,
            Json(GenerateResponse::accepted(&generation.id)),
        ))
    }
}

fn outcome_label(result: &Result<String, EngineError>) -> &'static str {
    match result {
        Ok(_) => "completed",
        Err(EngineError::Timeout { .. }) => "timed_out",
        Err(_) => "failed",
    }
}

async fn finish_metrics(
    state: &AppState,
    generation_id: &GenerationId,
    provider: ProviderKind,
    result: &Result<String, EngineError>,
    started: Instant,
) {
    let attempts = state
        .generations
        .get_generation(generation_id)
        .await
        .map(|g| g.attempts)
        .unwrap_or(0);

    metrics::record_generation(
        provider.as_str(),
        outcome_label(result),
        started.elapsed().as_secs_f64(),
        attempts,
    );
}
