//! Artifact download handlers.
//!
//! Serve the produced files directly out of the artifact store so clients
//! can fetch clips, subtitle tracks and thumbnails by (job, segment).

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use clipline_models::{ArtifactKind, ArtifactRef, HighlightSegment, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/videos/{id}/clips/{segment}` - the extracted clip bytes.
pub async fn get_clip(
    State(state): State<AppState>,
    Path((id, segment)): Path<(String, u32)>,
) -> ApiResult<impl IntoResponse> {
    serve_segment_artifact(&state, &id, segment, ArtifactKind::Clip).await
}

/// `GET /api/videos/{id}/subtitles/{segment}` - the WebVTT track.
pub async fn get_subtitle(
    State(state): State<AppState>,
    Path((id, segment)): Path<(String, u32)>,
) -> ApiResult<impl IntoResponse> {
    serve_segment_artifact(&state, &id, segment, ArtifactKind::Subtitle).await
}

/// `GET /api/videos/{id}/thumbnails/{segment}` - the midpoint still frame.
pub async fn get_thumbnail(
    State(state): State<AppState>,
    Path((id, segment)): Path<(String, u32)>,
) -> ApiResult<impl IntoResponse> {
    serve_segment_artifact(&state, &id, segment, ArtifactKind::Thumbnail).await
}

async fn serve_segment_artifact(
    state: &AppState,
    id: &str,
    segment: u32,
    kind: ArtifactKind,
) -> ApiResult<impl IntoResponse> {
    let job = state
        .orchestrator
        .status(&JobId::from_string(id))
        .await?;
    let seg = job
        .highlights
        .iter()
        .find(|s| s.index == segment)
        .ok_or_else(|| ApiError::not_found(format!("no segment {segment}")))?;

    let artifact = segment_ref(seg, kind)
        .ok_or_else(|| ApiError::not_found(format!("{} not yet produced", kind.prefix())))?;
    let bytes = state.store.get(artifact).await?;

    Ok(([(header::CONTENT_TYPE, content_type(kind))], bytes))
}

fn segment_ref(seg: &HighlightSegment, kind: ArtifactKind) -> Option<&ArtifactRef> {
    match kind {
        ArtifactKind::Clip => seg.clip_ref.as_ref(),
        ArtifactKind::Subtitle => seg.subtitle_ref.as_ref(),
        ArtifactKind::Thumbnail => seg.thumbnail_ref.as_ref(),
        _ => None,
    }
}

fn content_type(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Source | ArtifactKind::Clip => "video/mp4",
        ArtifactKind::Subtitle => "text/vtt",
        ArtifactKind::Thumbnail => "image/jpeg",
        ArtifactKind::Plan => "application/json",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(ArtifactKind::Clip), "video/mp4");
        assert_eq!(content_type(ArtifactKind::Subtitle), "text/vtt");
        assert_eq!(content_type(ArtifactKind::Thumbnail), "image/jpeg");
    }
}
