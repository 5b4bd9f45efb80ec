//! Job status, video reads, cancel and delete handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use clipline_models::{ContentPlan, HighlightSegment, JobErrorInfo, JobId, JobState, VideoJob};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Status response for frontend polling.
#[derive(Serialize)]
pub struct StatusResponse {
    pub id: String,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorInfo>,
    pub updated_at: String,
}

/// Summary used by the videos list.
#[derive(Serialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub state: JobState,
    pub highlight_count: usize,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct HighlightsResponse {
    pub video_id: String,
    pub highlights: Vec<HighlightSegment>,
}

/// `GET /api/status/{id}` - job state plus structured error info.
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job = state.orchestrator.status(&JobId::from_string(id)).await?;
    Ok(Json(StatusResponse {
        id: job.id.to_string(),
        state: job.state,
        error: job.error,
        updated_at: job.updated_at.to_rfc3339(),
    }))
}

/// `GET /api/videos` - all jobs, newest first.
pub async fn list_videos(State(state): State<AppState>) -> Json<Vec<VideoSummary>> {
    let videos = state
        .orchestrator
        .list()
        .await
        .into_iter()
        .map(|job| VideoSummary {
            id: job.id.to_string(),
            title: job.title,
            state: job.state,
            highlight_count: job.highlights.len(),
            created_at: job.created_at.to_rfc3339(),
        })
        .collect();
    Json(videos)
}

/// `GET /api/videos/{id}` - the full job record.
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoJob>> {
    let job = state.orchestrator.status(&JobId::from_string(id)).await?;
    Ok(Json(job))
}

/// `GET /api/videos/{id}/highlights` - highlight segments.
pub async fn get_highlights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HighlightsResponse>> {
    let job = state.orchestrator.status(&JobId::from_string(id)).await?;
    Ok(Json(HighlightsResponse {
        video_id: job.id.to_string(),
        highlights: job.highlights,
    }))
}

/// `GET /api/videos/{id}/content_plan` - 404 until the Plan stage ran.
pub async fn get_content_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentPlan>> {
    let job = state.orchestrator.status(&JobId::from_string(id)).await?;
    job.plan
        .map(Json)
        .ok_or_else(|| ApiError::not_found("content plan not yet available"))
}

/// `POST /api/videos/{id}/cancel` - request cancellation.
pub async fn cancel_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job_id = JobId::from_string(id);
    state.orchestrator.cancel(&job_id).await?;
    let job = state.orchestrator.status(&job_id).await?;
    info!(job_id = %job_id, state = %job.state, "Cancel handled");
    Ok(Json(StatusResponse {
        id: job.id.to_string(),
        state: job.state,
        error: job.error,
        updated_at: job.updated_at.to_rfc3339(),
    }))
}

/// `DELETE /api/videos/{id}` - remove a terminal job and its artifacts.
///
/// Returns 409 while the job is still in flight.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let job_id = JobId::from_string(id);
    state.orchestrator.delete(&job_id).await?;
    info!(job_id = %job_id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
