//! Shared data models for the Clipline backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and the pipeline state machine
//! - Highlight segments and their per-segment lifecycle
//! - Content plans
//! - Time range validation helpers

pub mod artifact;
pub mod job;
pub mod plan;
pub mod provider;
pub mod segment;
pub mod timerange;

// Re-export common types
pub use artifact::{ArtifactKind, ArtifactRef};
pub use job::{FailureCause, JobErrorInfo, JobId, JobState, StageKind, VideoJob};
pub use plan::{ContentPlan, ContentPlanEntry};
pub use provider::{ProviderError, ProviderResult};
pub use segment::{HighlightSegment, SegmentFailure};
pub use timerange::{overlap_secs, validate_range, TimeRangeError};
