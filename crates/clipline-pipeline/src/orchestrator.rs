//! The pipeline orchestrator.
//!
//! Owns the dispatch loop and the worker pool. Jobs are submitted onto an
//! unbounded channel; a fixed-size semaphore caps how many run at once.
//! Within a job, Extract and Subtitle fan out per segment under a second
//! per-job semaphore, then join before the next transition.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use clipline_analysis::AnalysisProvider;
use clipline_media::MediaToolchain;
use clipline_models::{
    ArtifactRef, FailureCause, JobId, JobState, SegmentFailure, StageKind, VideoJob,
};
use clipline_storage::ArtifactStore;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, StageFailure};
use crate::registry::JobRegistry;
use crate::stages::{
    plan_fanout, AnalyzeStage, ExtractStage, ExtractedClip, PlanStage, SubJob, SubtitleStage,
};

/// Artifacts produced by one sub-job, keyed by which fan-out it ran in.
enum SegmentArtifacts {
    Extracted(ExtractedClip),
    Subtitled(ArtifactRef),
}

/// Drives jobs through the pipeline.
///
/// All public methods are safe to call concurrently. `submit` is idempotent:
/// re-submitting a job that is pending, running, or finished is a no-op.
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    store: Arc<dyn ArtifactStore>,
    config: PipelineConfig,
    analyze: AnalyzeStage,
    extract: ExtractStage,
    subtitle: SubtitleStage,
    plan: PlanStage,
    job_tx: mpsc::UnboundedSender<JobId>,
    job_slots: Arc<Semaphore>,
    /// Cancel flag per pending or running job. Presence in this map is what
    /// makes `submit` idempotent.
    inflight: Mutex<HashMap<JobId, Arc<AtomicBool>>>,
}

impl Orchestrator {
    /// Build the orchestrator and spawn its dispatch loop.
    pub fn start(
        config: PipelineConfig,
        registry: Arc<JobRegistry>,
        store: Arc<dyn ArtifactStore>,
        provider: Arc<dyn AnalysisProvider>,
        toolchain: Arc<dyn MediaToolchain>,
    ) -> Arc<Self> {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let job_slots = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        let analyze = AnalyzeStage::new(provider, config.analyze.clone(), config.retry.clone());
        let extract = ExtractStage::new(
            Arc::clone(&toolchain),
            Arc::clone(&store),
            config.clip_format.clone(),
            config.retry.clone(),
        );
        let subtitle = SubtitleStage::new(toolchain, Arc::clone(&store), config.retry.clone());
        let plan = PlanStage::new(Arc::clone(&store));

        let orchestrator = Arc::new(Self {
            registry,
            store,
            config,
            analyze,
            extract,
            subtitle,
            plan,
            job_tx,
            job_slots,
            inflight: Mutex::new(HashMap::new()),
        });

        let dispatcher = Arc::clone(&orchestrator);
        tokio::spawn(dispatcher.dispatch_loop(job_rx));
        orchestrator
    }

    /// Queue a job for processing.
    ///
    /// No-op when the job is already pending, running, or past `Queued`.
    pub async fn submit(&self, job_id: &JobId) -> PipelineResult<()> {
        let job = self.registry.snapshot(job_id).await?;

        let mut inflight = self.inflight.lock().await;
        if inflight.contains_key(job_id) || job.state != JobState::Queued {
            return Ok(());
        }
        inflight.insert(job_id.clone(), Arc::new(AtomicBool::new(false)));
        drop(inflight);

        self.job_tx
            .send(job_id.clone())
            .map_err(|_| PipelineError::Shutdown)?;
        info!(job_id = %job_id, "Job queued for processing");
        Ok(())
    }

    /// Snapshot a job record.
    pub async fn status(&self, job_id: &JobId) -> PipelineResult<VideoJob> {
        self.registry.snapshot(job_id).await
    }

    /// Snapshot every job, newest first.
    pub async fn list(&self) -> Vec<VideoJob> {
        self.registry.list().await
    }

    /// Request cancellation of a job.
    ///
    /// A pending or running job stops at its next stage boundary; a queued
    /// job that was never submitted fails immediately. Cancelling a terminal
    /// job is a no-op.
    pub async fn cancel(&self, job_id: &JobId) -> PipelineResult<()> {
        let job = self.registry.snapshot(job_id).await?;
        if job.state.is_terminal() {
            return Ok(());
        }

        if let Some(flag) = self.inflight.lock().await.get(job_id) {
            flag.store(true, Ordering::SeqCst);
            info!(job_id = %job_id, "Cancellation requested");
            return Ok(());
        }

        // Not in flight, so no worker will ever observe the flag.
        self.registry
            .fail(
                job_id,
                stage_for_state(job.state),
                FailureCause::Cancelled,
                false,
            )
            .await?;
        info!(job_id = %job_id, "Cancelled before dispatch");
        Ok(())
    }

    /// Delete a terminal job and every artifact it produced.
    ///
    /// Refuses while the job is in flight; cancel first.
    pub async fn delete(&self, job_id: &JobId) -> PipelineResult<()> {
        let job = self.registry.snapshot(job_id).await?;
        if !job.state.is_terminal() {
            return Err(PipelineError::JobInFlight(job_id.clone()));
        }

        self.registry.remove(job_id).await?;
        self.store.delete_job_artifacts(job_id).await?;
        info!(job_id = %job_id, "Deleted job and artifacts");
        Ok(())
    }

    /// States a job has passed through, in order.
    pub async fn history(&self, job_id: &JobId) -> PipelineResult<Vec<JobState>> {
        self.registry.history(job_id).await
    }

    async fn dispatch_loop(self: Arc<Self>, mut job_rx: mpsc::UnboundedReceiver<JobId>) {
        while let Some(job_id) = job_rx.recv().await {
            let permit = match Arc::clone(&self.job_slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                let cancel = this
                    .inflight
                    .lock()
                    .await
                    .get(&job_id)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));

                if let Err(e) = Arc::clone(&this).run_job(&job_id, &cancel).await {
                    error!(job_id = %job_id, "Job run aborted: {}", e);
                }

                this.inflight.lock().await.remove(&job_id);
                drop(permit);
            });
        }
    }

    /// Run one job from `Queued` to a terminal state.
    ///
    /// Returns `Err` only for registry-level problems (job deleted underneath
    /// us, illegal edge); stage failures are recorded on the record and
    /// return `Ok`.
    async fn run_job(self: Arc<Self>, job_id: &JobId, cancel: &Arc<AtomicBool>) -> PipelineResult<()> {
        // Analyze
        if self.check_cancelled(job_id, cancel, StageKind::Analyze).await? {
            return Ok(());
        }
        self.registry.transition(job_id, JobState::Analyzing).await?;

        let job = self.registry.snapshot(job_id).await?;
        let Some(duration) = job.duration_secs else {
            // The source was never probed, so analysis has nothing to bound
            // candidate ranges against.
            self.record_failure(
                job_id,
                StageFailure::new(StageKind::Analyze, FailureCause::InvalidInput),
            )
            .await?;
            return Ok(());
        };

        let (source, _scratch) = match self.materialize_source(&job.source_ref).await {
            Ok(local) => local,
            Err(failure) => {
                self.record_failure(job_id, failure).await?;
                return Ok(());
            }
        };

        let highlights = match self.analyze.execute(&source, duration).await {
            Ok(highlights) => highlights,
            Err(failure) => {
                self.record_failure(job_id, failure).await?;
                return Ok(());
            }
        };
        self.registry
            .update(job_id, |job| job.highlights = highlights)
            .await?;
        self.registry.transition(job_id, JobState::Segmented).await?;

        // Extract fan-out
        if self.check_cancelled(job_id, cancel, StageKind::Extract).await? {
            return Ok(());
        }
        self.registry.transition(job_id, JobState::Processing).await?;

        let sub_jobs = plan_fanout(&self.registry.snapshot(job_id).await?);
        let extracted = self
            .extract_all(job_id, source.clone(), sub_jobs, cancel)
            .await;

        if cancel.load(Ordering::SeqCst) {
            self.registry
                .fail(job_id, StageKind::Extract, FailureCause::Cancelled, false)
                .await?;
            info!(job_id = %job_id, "Job cancelled during extraction");
            return Ok(());
        }
        if extracted == 0 {
            self.registry
                .fail(job_id, StageKind::Extract, FailureCause::AllSegmentsFailed, false)
                .await?;
            warn!(job_id = %job_id, "Every segment failed extraction");
            return Ok(());
        }

        // Subtitle fan-out
        self.registry.transition(job_id, JobState::Subtitling).await?;
        self.subtitle_all(job_id, cancel).await;

        if self.check_cancelled(job_id, cancel, StageKind::Subtitle).await? {
            return Ok(());
        }

        // Plan
        self.registry.transition(job_id, JobState::Planning).await?;
        let job = self.registry.snapshot(job_id).await?;
        match self.plan.execute(&job).await {
            Ok((plan, plan_ref)) => {
                self.registry
                    .update(job_id, |job| {
                        for entry in &plan.entries {
                            if let Some(seg) = job
                                .highlights
                                .iter_mut()
                                .find(|s| s.index == entry.segment_index)
                            {
                                seg.caption = Some(entry.caption.clone());
                                seg.suggested_post_date =
                                    Some(entry.suggested_post_date.clone());
                            }
                        }
                        job.plan = Some(plan);
                        job.plan_ref = Some(plan_ref);
                    })
                    .await?;
                self.registry.transition(job_id, JobState::Completed).await?;
                info!(job_id = %job_id, "Job completed");
            }
            Err(failure) => {
                self.record_failure(job_id, failure).await?;
            }
        }
        Ok(())
    }

    /// Run every extract sub-job under the per-job parallelism cap.
    ///
    /// Results are recorded on the job as they land; the return value is the
    /// number of segments that produced a clip.
    async fn extract_all(
        self: &Arc<Self>,
        job_id: &JobId,
        source: PathBuf,
        sub_jobs: Vec<SubJob>,
        cancel: &Arc<AtomicBool>,
    ) -> usize {
        let segment_slots = Arc::new(Semaphore::new(self.config.max_segment_parallel));
        let mut tasks = JoinSet::new();

        for sub_job in sub_jobs {
            let this = Arc::clone(self);
            let job_id = job_id.clone();
            let source = source.clone();
            let slots = Arc::clone(&segment_slots);
            let cancel = Arc::clone(cancel);
            tasks.spawn(async move {
                let Ok(_permit) = slots.acquire_owned().await else {
                    return false;
                };
                if cancel.load(Ordering::SeqCst) {
                    return false;
                }

                let outcome = this
                    .extract
                    .execute(&job_id, &source, &sub_job)
                    .await
                    .map(SegmentArtifacts::Extracted);
                this.record_segment_outcome(
                    &job_id,
                    sub_job.segment_index,
                    StageKind::Extract,
                    outcome,
                )
                .await
            });
        }

        let mut successes = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => successes += 1,
                Ok(false) => {}
                Err(e) => error!(job_id = %job_id, "Extract sub-task panicked: {}", e),
            }
        }
        successes
    }

    /// Generate subtitles for every segment that produced a clip.
    ///
    /// Subtitle failures are per-segment and non-fatal; the segment is simply
    /// left out of the content plan.
    async fn subtitle_all(self: &Arc<Self>, job_id: &JobId, cancel: &Arc<AtomicBool>) {
        let job = match self.registry.snapshot(job_id).await {
            Ok(job) => job,
            Err(_) => return,
        };

        let segment_slots = Arc::new(Semaphore::new(self.config.max_segment_parallel));
        let mut tasks = JoinSet::new();

        for seg in &job.highlights {
            let Some(clip_ref) = seg.clip_ref.clone() else {
                continue;
            };
            let this = Arc::clone(self);
            let job_id = job_id.clone();
            let index = seg.index;
            let slots = Arc::clone(&segment_slots);
            let cancel = Arc::clone(cancel);
            tasks.spawn(async move {
                let Ok(_permit) = slots.acquire_owned().await else {
                    return false;
                };
                if cancel.load(Ordering::SeqCst) {
                    return false;
                }

                let outcome = this
                    .subtitle
                    .execute(&job_id, index, &clip_ref)
                    .await
                    .map(SegmentArtifacts::Subtitled);
                this.record_segment_outcome(&job_id, index, StageKind::Subtitle, outcome)
                    .await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(job_id = %job_id, "Subtitle sub-task panicked: {}", e);
            }
        }
    }

    /// Record one sub-job result under the job's lock. Returns success.
    async fn record_segment_outcome(
        &self,
        job_id: &JobId,
        segment_index: u32,
        stage: StageKind,
        outcome: Result<SegmentArtifacts, StageFailure>,
    ) -> bool {
        let success = outcome.is_ok();
        let updated = self
            .registry
            .update(job_id, |job| {
                let Some(seg) = job
                    .highlights
                    .iter_mut()
                    .find(|s| s.index == segment_index)
                else {
                    return;
                };
                match &outcome {
                    Ok(SegmentArtifacts::Extracted(extracted)) => {
                        seg.clip_ref = Some(extracted.clip.clone());
                        seg.thumbnail_ref = extracted.thumbnail.clone();
                    }
                    Ok(SegmentArtifacts::Subtitled(artifact)) => {
                        seg.subtitle_ref = Some(artifact.clone());
                    }
                    Err(failure) => {
                        warn!(
                            job_id = %job.id,
                            segment = segment_index,
                            stage = %stage,
                            cause = ?failure.cause,
                            "Segment sub-job failed"
                        );
                        seg.failure = Some(SegmentFailure {
                            stage,
                            cause: failure.cause,
                        });
                    }
                }
            })
            .await;
        updated.is_ok() && success
    }

    /// Fail the job if its cancel flag is set. Returns true when cancelled.
    async fn check_cancelled(
        &self,
        job_id: &JobId,
        cancel: &Arc<AtomicBool>,
        stage: StageKind,
    ) -> PipelineResult<bool> {
        if !cancel.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.registry
            .fail(job_id, stage, FailureCause::Cancelled, false)
            .await?;
        info!(job_id = %job_id, %stage, "Job cancelled");
        Ok(true)
    }

    async fn record_failure(&self, job_id: &JobId, failure: StageFailure) -> PipelineResult<()> {
        warn!(
            job_id = %job_id,
            stage = %failure.stage,
            cause = ?failure.cause,
            retries_exhausted = failure.retries_exhausted,
            "Stage failed"
        );
        self.registry
            .fail(job_id, failure.stage, failure.cause, failure.retries_exhausted)
            .await
    }

    /// Resolve the source video to a local path the stages can read.
    async fn materialize_source(
        &self,
        source_ref: &ArtifactRef,
    ) -> Result<(PathBuf, Option<tempfile::TempDir>), StageFailure> {
        if let Some(path) = self.store.local_path(source_ref) {
            return Ok((path, None));
        }

        let bytes = self
            .store
            .get(source_ref)
            .await
            .map_err(|_| StageFailure::new(StageKind::Analyze, FailureCause::Internal))?;
        let scratch = tempfile::tempdir()
            .map_err(|_| StageFailure::new(StageKind::Analyze, FailureCause::Internal))?;
        let path = scratch.path().join("source.mp4");
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|_| StageFailure::new(StageKind::Analyze, FailureCause::Internal))?;
        Ok((path, Some(scratch)))
    }
}

/// The stage a job in `state` is working toward, for cancellation reporting.
fn stage_for_state(state: JobState) -> StageKind {
    match state {
        JobState::Queued | JobState::Analyzing => StageKind::Analyze,
        JobState::Segmented | JobState::Processing => StageKind::Extract,
        JobState::Subtitling => StageKind::Subtitle,
        JobState::Planning | JobState::Completed | JobState::Failed => StageKind::Plan,
    }
}
