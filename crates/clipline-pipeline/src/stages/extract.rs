//! Extract stage: per-segment clip extraction sub-job.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use clipline_media::{ClipFormat, MediaToolchain};
use clipline_models::{ArtifactRef, FailureCause, JobId, StageKind};
use clipline_storage::{ArtifactKey, ArtifactStore};

use crate::error::StageFailure;
use crate::retry::{call_with_retry, RetryPolicy};
use crate::stages::segment::SubJob;

/// Artifacts produced by one extract sub-job.
pub struct ExtractedClip {
    pub clip: ArtifactRef,
    /// Absent when the frame grab failed; never fails the segment.
    pub thumbnail: Option<ArtifactRef>,
}

/// Executor for per-segment clip extraction.
pub struct ExtractStage {
    toolchain: Arc<dyn MediaToolchain>,
    store: Arc<dyn ArtifactStore>,
    format: ClipFormat,
    retry: RetryPolicy,
}

impl ExtractStage {
    pub fn new(
        toolchain: Arc<dyn MediaToolchain>,
        store: Arc<dyn ArtifactStore>,
        format: ClipFormat,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            toolchain,
            store,
            format,
            retry,
        }
    }

    /// Extract one segment's clip and midpoint thumbnail, and store them.
    ///
    /// Clip failure is scoped to the segment; the orchestrator only fails the
    /// job when every segment fails. Thumbnail failure is scoped further
    /// still: the segment keeps its clip and just goes without a still frame.
    pub async fn execute(
        &self,
        job_id: &JobId,
        source: &Path,
        sub_job: &SubJob,
    ) -> Result<ExtractedClip, StageFailure> {
        let bytes = call_with_retry(&self.retry, "extract_clip", || {
            self.toolchain.extract_clip(
                source,
                sub_job.start_secs,
                sub_job.end_secs,
                &self.format,
            )
        })
        .await
        .map_err(|(e, exhausted)| StageFailure::from_provider(StageKind::Extract, &e, exhausted))?;

        let key = ArtifactKey::clip(job_id, sub_job.segment_index);
        let clip = self
            .store
            .put(&key, &bytes)
            .await
            .map_err(|_| StageFailure::new(StageKind::Extract, FailureCause::Internal))?;

        let thumbnail = self.grab_thumbnail(job_id, source, sub_job).await;

        info!(
            job_id = %job_id,
            segment = sub_job.segment_index,
            "Extracted clip"
        );
        Ok(ExtractedClip { clip, thumbnail })
    }

    /// Grab and store the still frame at the segment's midpoint.
    async fn grab_thumbnail(
        &self,
        job_id: &JobId,
        source: &Path,
        sub_job: &SubJob,
    ) -> Option<ArtifactRef> {
        let midpoint = sub_job.start_secs + (sub_job.end_secs - sub_job.start_secs) / 2.0;
        let bytes = match call_with_retry(&self.retry, "extract_thumbnail", || {
            self.toolchain.extract_thumbnail(source, midpoint)
        })
        .await
        {
            Ok(bytes) => bytes,
            Err((e, _)) => {
                warn!(
                    job_id = %job_id,
                    segment = sub_job.segment_index,
                    "Thumbnail grab failed: {}",
                    e
                );
                return None;
            }
        };

        let key = ArtifactKey::thumbnail(job_id, sub_job.segment_index);
        match self.store.put(&key, &bytes).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    segment = sub_job.segment_index,
                    "Thumbnail store failed: {}",
                    e
                );
                None
            }
        }
    }
}
