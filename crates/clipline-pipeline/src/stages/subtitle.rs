//! Subtitle stage: per-clip WebVTT generation.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use clipline_media::MediaToolchain;
use clipline_models::{ArtifactRef, FailureCause, JobId, StageKind};
use clipline_storage::{ArtifactKey, ArtifactStore};

use crate::error::StageFailure;
use crate::retry::{call_with_retry, RetryPolicy};

/// Executor for per-segment subtitle generation.
///
/// Consumes a stored clip and produces a WebVTT track next to it. A segment
/// whose clip extraction failed is never handed to this stage.
pub struct SubtitleStage {
    toolchain: Arc<dyn MediaToolchain>,
    store: Arc<dyn ArtifactStore>,
    retry: RetryPolicy,
}

impl SubtitleStage {
    pub fn new(
        toolchain: Arc<dyn MediaToolchain>,
        store: Arc<dyn ArtifactStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            toolchain,
            store,
            retry,
        }
    }

    /// Transcribe one segment's clip and store the subtitle track.
    pub async fn execute(
        &self,
        job_id: &JobId,
        segment_index: u32,
        clip_ref: &ArtifactRef,
    ) -> Result<ArtifactRef, StageFailure> {
        let (clip_path, _scratch) = self.materialize_clip(clip_ref).await?;

        let vtt = call_with_retry(&self.retry, "transcribe", || {
            self.toolchain.transcribe(&clip_path)
        })
        .await
        .map_err(|(e, exhausted)| {
            StageFailure::from_provider(StageKind::Subtitle, &e, exhausted)
        })?;

        let key = ArtifactKey::subtitle(job_id, segment_index);
        let artifact = self
            .store
            .put(&key, vtt.as_bytes())
            .await
            .map_err(|_| StageFailure::new(StageKind::Subtitle, FailureCause::Internal))?;

        info!(job_id = %job_id, segment = segment_index, "Generated subtitles");
        Ok(artifact)
    }

    /// Resolve the clip to a local path the toolchain can read.
    ///
    /// The local backend exposes its path directly; other backends fall back
    /// to a scratch copy that lives as long as the returned guard.
    async fn materialize_clip(
        &self,
        clip_ref: &ArtifactRef,
    ) -> Result<(PathBuf, Option<tempfile::TempDir>), StageFailure> {
        if let Some(path) = self.store.local_path(clip_ref) {
            return Ok((path, None));
        }

        let bytes = self
            .store
            .get(clip_ref)
            .await
            .map_err(|_| StageFailure::new(StageKind::Subtitle, FailureCause::Internal))?;
        let scratch = tempfile::tempdir()
            .map_err(|_| StageFailure::new(StageKind::Subtitle, FailureCause::Internal))?;
        let path = scratch.path().join("clip.mp4");
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|_| StageFailure::new(StageKind::Subtitle, FailureCause::Internal))?;
        Ok((path, Some(scratch)))
    }
}
