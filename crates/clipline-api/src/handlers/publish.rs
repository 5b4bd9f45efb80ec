//! Publish stub handlers.

use axum::extract::{Path, State};
use axum::Json;

use clipline_models::JobId;

use crate::error::{ApiError, ApiResult};
use crate::publish::{Platform, PublishReceipt};
use crate::state::AppState;

/// `POST /api/publish/youtube/{id}/{segment}`
pub async fn publish_youtube(
    State(state): State<AppState>,
    Path((id, segment)): Path<(String, u32)>,
) -> ApiResult<Json<PublishReceipt>> {
    publish_segment(state, Platform::Youtube, id, segment).await
}

/// `POST /api/publish/instagram/{id}/{segment}`
pub async fn publish_instagram(
    State(state): State<AppState>,
    Path((id, segment)): Path<(String, u32)>,
) -> ApiResult<Json<PublishReceipt>> {
    publish_segment(state, Platform::Instagram, id, segment).await
}

async fn publish_segment(
    state: AppState,
    platform: Platform,
    id: String,
    segment_index: u32,
) -> ApiResult<Json<PublishReceipt>> {
    let job_id = JobId::from_string(id);
    let job = state.orchestrator.status(&job_id).await?;

    let segment = job
        .highlights
        .iter()
        .find(|s| s.index == segment_index)
        .ok_or_else(|| ApiError::not_found(format!("no segment {segment_index}")))?;
    let clip_ref = segment
        .clip_ref
        .as_ref()
        .ok_or_else(|| ApiError::conflict(format!("segment {segment_index} has no clip yet")))?;

    let receipt = state
        .publisher
        .publish(
            platform,
            &job_id,
            segment_index,
            clip_ref,
            segment.caption.as_deref(),
        )
        .await;
    Ok(Json(receipt))
}
