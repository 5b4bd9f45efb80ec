//! Video upload handler.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use clipline_media::probe_video;
use clipline_models::{ArtifactRef, JobState, VideoJob};
use clipline_storage::ArtifactKey;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Content types accepted for upload.
const ACCEPTED_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/x-msvideo"];

/// Upload response.
#[derive(Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub title: String,
    pub state: JobState,
    pub duration_secs: f64,
}

struct UploadForm {
    file: Vec<u8>,
    filename: String,
    content_type: String,
    title: Option<String>,
    description: Option<String>,
}

/// `POST /api/upload` - multipart video upload.
///
/// Stores the source, probes its duration, registers a queued job and
/// submits it to the orchestrator.
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let form = read_form(multipart).await?;

    if !ACCEPTED_TYPES.contains(&form.content_type.as_str()) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "unsupported content type: {}",
            form.content_type
        )));
    }
    if form.file.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }

    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| form.filename.clone());

    let mut job = VideoJob::new(
        title,
        form.filename,
        form.content_type,
        ArtifactRef::new("pending"),
    )
    .with_description(form.description.filter(|d| !d.trim().is_empty()));

    let key = ArtifactKey::source(&job.id);
    let source_ref = state.store.put(&key, &form.file).await?;
    job.source_ref = source_ref.clone();

    // The local backend exposes the stored file directly for probing.
    let duration = match state.store.local_path(&source_ref) {
        Some(path) => probe_video(&path).await.map_err(|e| {
            warn!(job_id = %job.id, "Probe rejected upload: {}", e);
            ApiError::bad_request(format!("could not read video: {e}"))
        }),
        None => Err(ApiError::internal("source has no local path")),
    };
    let duration = match duration {
        Ok(info) => info.duration,
        Err(e) => {
            // Unusable upload, drop the stored bytes before reporting.
            let _ = state.store.delete(&source_ref).await;
            return Err(e);
        }
    };
    job.duration_secs = Some(duration);

    let id = job.id.clone();
    let title = job.title.clone();
    state.registry.insert(job).await;
    state.orchestrator.submit(&id).await?;

    info!(job_id = %id, duration_secs = duration, "Upload accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            id: id.to_string(),
            title,
            state: JobState::Queued,
            duration_secs: duration,
        }),
    ))
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut file = None;
    let mut filename = None;
    let mut content_type = None;
    let mut title = None;
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                file = Some(bytes.to_vec());
            }
            "title" => {
                title = Some(field.text().await.unwrap_or_default());
            }
            "description" => {
                description = Some(field.text().await.unwrap_or_default());
            }
            other => {
                warn!(field = other, "Ignoring unknown upload field");
            }
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("missing 'file' field"))?;
    Ok(UploadForm {
        file,
        filename: filename.unwrap_or_else(|| "upload.mp4".to_string()),
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        title,
        description,
    })
}
