//! Job record and pipeline state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{ArtifactRef, ContentPlan, HighlightSegment};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline state of a job.
///
/// Transitions are monotonic along a fixed partial order; `Failed` is an
/// absorbing state reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for the orchestrator to dispatch
    #[default]
    Queued,
    /// Analysis provider call in flight
    Analyzing,
    /// Highlights accepted, fan-out not yet started
    Segmented,
    /// Extract sub-jobs running
    Processing,
    /// Subtitle sub-jobs running
    Subtitling,
    /// Content plan synthesis
    Planning,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Analyzing => "analyzing",
            JobState::Segmented => "segmented",
            JobState::Processing => "processing",
            JobState::Subtitling => "subtitling",
            JobState::Planning => "planning",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether the state machine permits moving from `self` to `to`.
    pub fn can_transition(&self, to: JobState) -> bool {
        use JobState::*;
        match (self, to) {
            // Failure is reachable from any non-terminal state
            (from, Failed) if !from.is_terminal() => true,
            (Queued, Analyzing) => true,
            (Analyzing, Segmented) => true,
            (Segmented, Processing) => true,
            (Processing, Subtitling) => true,
            (Subtitling, Planning) => true,
            (Planning, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline stage identifier, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Analyze,
    Segment,
    Extract,
    Subtitle,
    Plan,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Analyze => "analyze",
            StageKind::Segment => "segment",
            StageKind::Extract => "extract",
            StageKind::Subtitle => "subtitle",
            StageKind::Plan => "plan",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured cause of a job failure.
///
/// Raw provider messages never appear here; the routing layer only ever sees
/// this closed taxonomy, so the contract stays stable across provider changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Transient provider failure that exhausted the retry budget
    ProviderTransient,
    /// Provider rejected the input (corrupt video, zero-duration clip)
    InvalidInput,
    /// Provider quota permanently exhausted
    QuotaExceeded,
    /// Analysis found zero usable highlights (valid outcome, not a bug)
    NoHighlightsFound,
    /// Every per-segment extract sub-job failed
    AllSegmentsFailed,
    /// Job was cancelled
    Cancelled,
    /// Local computation error
    Internal,
}

/// Error info recorded on a failed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobErrorInfo {
    /// Stage that failed
    pub stage: StageKind,
    /// Structured failure cause
    pub cause: FailureCause,
    /// Whether the retry budget was exhausted before failing
    pub retries_exhausted: bool,
}

/// The durable record of one video's journey through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoJob {
    /// Unique job ID, assigned at upload
    pub id: JobId,

    /// User-supplied title
    pub title: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Original upload filename
    pub original_filename: String,

    /// Upload content type
    pub content_type: String,

    /// Handle to the stored source video
    pub source_ref: ArtifactRef,

    /// Source duration in seconds, probed after upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,

    /// Current pipeline state
    #[serde(default)]
    pub state: JobState,

    /// Highlight segments in priority order (empty until analysis completes)
    #[serde(default)]
    pub highlights: Vec<HighlightSegment>,

    /// Content plan, populated by the Plan stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ContentPlan>,

    /// Handle to the stored plan document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_ref: Option<ArtifactRef>,

    /// Present only when `state == Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobErrorInfo>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Advances on every state transition
    pub updated_at: DateTime<Utc>,
}

impl VideoJob {
    /// Create a new queued job for an uploaded video.
    pub fn new(
        title: impl Into<String>,
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        source_ref: ArtifactRef,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            title: title.into(),
            description: None,
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            source_ref,
            duration_secs: None,
            state: JobState::Queued,
            highlights: Vec::new(),
            plan: None,
            plan_ref: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the optional description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Advance to `to`, touching `updated_at`.
    ///
    /// The caller (the registry) is responsible for checking
    /// [`JobState::can_transition`] first.
    pub fn advance(&mut self, to: JobState) {
        self.state = to;
        self.updated_at = Utc::now();
    }

    /// Record a failure and move to the absorbing `Failed` state.
    pub fn fail(&mut self, stage: StageKind, cause: FailureCause, retries_exhausted: bool) {
        self.state = JobState::Failed;
        self.error = Some(JobErrorInfo {
            stage,
            cause,
            retries_exhausted,
        });
        self.updated_at = Utc::now();
    }

    /// Segments that produced both a clip and a subtitle track.
    pub fn fully_processed_segments(&self) -> impl Iterator<Item = &HighlightSegment> {
        self.highlights
            .iter()
            .filter(|s| s.clip_ref.is_some() && s.subtitle_ref.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> VideoJob {
        VideoJob::new(
            "Demo",
            "demo.mp4",
            "video/mp4",
            ArtifactRef::new("sources/x.mp4"),
        )
    }

    #[test]
    fn test_job_creation() {
        let job = job();
        assert_eq!(job.state, JobState::Queued);
        assert!(job.highlights.is_empty());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_happy_path_edges() {
        use JobState::*;
        let path = [
            Queued, Analyzing, Segmented, Processing, Subtitling, Planning, Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_no_skipping_stages() {
        use JobState::*;
        assert!(!Queued.can_transition(Segmented));
        assert!(!Analyzing.can_transition(Processing));
        assert!(!Segmented.can_transition(Subtitling));
        assert!(!Processing.can_transition(Planning));
        assert!(!Processing.can_transition(Completed));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        use JobState::*;
        for state in [Queued, Analyzing, Segmented, Processing, Subtitling, Planning] {
            assert!(state.can_transition(Failed));
        }
        assert!(!Completed.can_transition(Failed));
        assert!(!Failed.can_transition(Failed));
        assert!(!Failed.can_transition(Analyzing));
    }

    #[test]
    fn test_fail_records_error_info() {
        let mut job = job();
        job.fail(StageKind::Analyze, FailureCause::NoHighlightsFound, false);
        assert_eq!(job.state, JobState::Failed);
        let err = job.error.expect("error info");
        assert_eq!(err.stage, StageKind::Analyze);
        assert_eq!(err.cause, FailureCause::NoHighlightsFound);
        assert!(!err.retries_exhausted);
    }

    #[test]
    fn test_updated_at_advances() {
        let mut job = job();
        let before = job.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        job.advance(JobState::Analyzing);
        assert!(job.updated_at > before);
    }
}
