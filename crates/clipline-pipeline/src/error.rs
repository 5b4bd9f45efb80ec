//! Pipeline error types.

use thiserror::Error;

use clipline_models::{FailureCause, JobId, JobState, ProviderError, StageKind};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by the orchestrator API.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {0} is still in flight; cancel it before deleting")]
    JobInFlight(JobId),

    #[error("Illegal transition {from} -> {to} for job {job_id}")]
    IllegalTransition {
        job_id: JobId,
        from: JobState,
        to: JobState,
    },

    #[error("Orchestrator is shut down")]
    Shutdown,

    #[error("Storage error: {0}")]
    Storage(#[from] clipline_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] clipline_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Typed outcome of a failed stage, ready to be recorded on the job.
///
/// Stage executors translate every provider error into this shape before it
/// touches the job record; raw provider messages stop here.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: StageKind,
    pub cause: FailureCause,
    pub retries_exhausted: bool,
}

impl StageFailure {
    pub fn new(stage: StageKind, cause: FailureCause) -> Self {
        Self {
            stage,
            cause,
            retries_exhausted: false,
        }
    }

    /// Build from a provider error that is final (retries already applied).
    pub fn from_provider(stage: StageKind, error: &ProviderError, retries_exhausted: bool) -> Self {
        Self {
            stage,
            cause: error.failure_cause(),
            retries_exhausted,
        }
    }
}
