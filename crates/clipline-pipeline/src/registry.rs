//! In-memory job registry with per-job exclusive access.
//!
//! The registry is the only structure mutated by multiple workers. The outer
//! map is read-locked on the hot path; each entry carries its own mutex, so
//! two sub-jobs of different jobs (or of the same job) serialize only on that
//! job's record, never on a global lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use clipline_models::{FailureCause, JobId, JobState, StageKind, VideoJob};

use crate::error::{PipelineError, PipelineResult};

/// Registry entry: the record plus the states it has passed through.
#[derive(Debug)]
struct JobEntry {
    job: VideoJob,
    /// Every state this job has been in, in order. Used for diagnostics and
    /// to audit that only legal edges were taken.
    history: Vec<JobState>,
}

/// Index of all job records.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<JobEntry>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created job.
    pub async fn insert(&self, job: VideoJob) {
        let id = job.id.clone();
        let state = job.state;
        let entry = JobEntry {
            job,
            history: vec![state],
        };
        self.jobs
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(entry)));
    }

    async fn entry(&self, job_id: &JobId) -> PipelineResult<Arc<Mutex<JobEntry>>> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| PipelineError::JobNotFound(job_id.clone()))
    }

    /// Non-blocking-ish snapshot clone of a job record.
    pub async fn snapshot(&self, job_id: &JobId) -> PipelineResult<VideoJob> {
        let entry = self.entry(job_id).await?;
        let guard = entry.lock().await;
        Ok(guard.job.clone())
    }

    /// Snapshot every job, newest first.
    pub async fn list(&self) -> Vec<VideoJob> {
        let entries: Vec<_> = self.jobs.read().await.values().cloned().collect();
        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            jobs.push(entry.lock().await.job.clone());
        }
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// States a job has passed through, in order.
    pub async fn history(&self, job_id: &JobId) -> PipelineResult<Vec<JobState>> {
        let entry = self.entry(job_id).await?;
        let guard = entry.lock().await;
        Ok(guard.history.clone())
    }

    /// Advance a job along a legal state-machine edge.
    pub async fn transition(&self, job_id: &JobId, to: JobState) -> PipelineResult<()> {
        let entry = self.entry(job_id).await?;
        let mut guard = entry.lock().await;
        let from = guard.job.state;
        if !from.can_transition(to) {
            warn!(job_id = %job_id, %from, %to, "Rejected illegal transition");
            return Err(PipelineError::IllegalTransition {
                job_id: job_id.clone(),
                from,
                to,
            });
        }
        guard.job.advance(to);
        guard.history.push(to);
        Ok(())
    }

    /// Move a job to `Failed` with structured error info.
    ///
    /// No-op when the job is already terminal, so a late failure never
    /// clobbers a completed record.
    pub async fn fail(
        &self,
        job_id: &JobId,
        stage: StageKind,
        cause: FailureCause,
        retries_exhausted: bool,
    ) -> PipelineResult<()> {
        let entry = self.entry(job_id).await?;
        let mut guard = entry.lock().await;
        if guard.job.state.is_terminal() {
            return Ok(());
        }
        guard.job.fail(stage, cause, retries_exhausted);
        guard.history.push(JobState::Failed);
        Ok(())
    }

    /// Mutate a job record under its exclusive lock.
    ///
    /// Used by fan-in to record sub-job results; concurrent callers for the
    /// same job serialize here, so updates are never lost.
    pub async fn update<F, R>(&self, job_id: &JobId, f: F) -> PipelineResult<R>
    where
        F: FnOnce(&mut VideoJob) -> R,
    {
        let entry = self.entry(job_id).await?;
        let mut guard = entry.lock().await;
        Ok(f(&mut guard.job))
    }

    /// Remove a job record entirely.
    pub async fn remove(&self, job_id: &JobId) -> PipelineResult<VideoJob> {
        let entry = self
            .jobs
            .write()
            .await
            .remove(job_id)
            .ok_or_else(|| PipelineError::JobNotFound(job_id.clone()))?;
        let guard = entry.lock().await;
        Ok(guard.job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipline_models::ArtifactRef;

    fn job() -> VideoJob {
        VideoJob::new("t", "t.mp4", "video/mp4", ArtifactRef::new("sources/t.mp4"))
    }

    #[tokio::test]
    async fn test_transition_rejects_illegal_edge() {
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id.clone();
        registry.insert(job).await;

        assert!(registry.transition(&id, JobState::Analyzing).await.is_ok());
        let err = registry
            .transition(&id, JobState::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::IllegalTransition { .. }));

        // The record is untouched by the rejected transition
        assert_eq!(
            registry.snapshot(&id).await.unwrap().state,
            JobState::Analyzing
        );
    }

    #[tokio::test]
    async fn test_fail_is_noop_on_terminal_job() {
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id.clone();
        registry.insert(job).await;

        registry
            .fail(&id, StageKind::Analyze, FailureCause::NoHighlightsFound, false)
            .await
            .unwrap();
        // A straggler result arriving after failure must not overwrite it
        registry
            .fail(&id, StageKind::Extract, FailureCause::Internal, false)
            .await
            .unwrap();

        let snap = registry.snapshot(&id).await.unwrap();
        assert_eq!(
            snap.error.unwrap().cause,
            FailureCause::NoHighlightsFound
        );
    }

    #[tokio::test]
    async fn test_history_tracks_every_state() {
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id.clone();
        registry.insert(job).await;

        registry.transition(&id, JobState::Analyzing).await.unwrap();
        registry.transition(&id, JobState::Segmented).await.unwrap();
        registry
            .fail(&id, StageKind::Extract, FailureCause::AllSegmentsFailed, false)
            .await
            .unwrap();

        assert_eq!(
            registry.history(&id).await.unwrap(),
            vec![
                JobState::Queued,
                JobState::Analyzing,
                JobState::Segmented,
                JobState::Failed
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_updates_serialize_per_job() {
        let registry = Arc::new(JobRegistry::new());
        let job = job();
        let id = job.id.clone();
        registry.insert(job).await;

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .update(&id, |job| {
                        job.highlights.push(clipline_models::HighlightSegment::new(
                            i, "seg", 0.0, 1.0, 0.5, "r",
                        ));
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // No lost updates
        assert_eq!(registry.snapshot(&id).await.unwrap().highlights.len(), 16);
    }
}
