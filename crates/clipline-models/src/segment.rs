//! Highlight segment models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{FailureCause, StageKind};
use crate::ArtifactRef;

/// Per-segment failure record.
///
/// Segment failures are non-fatal; they only fail the job when every segment
/// fails extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentFailure {
    /// Stage that failed for this segment (Extract or Subtitle)
    pub stage: StageKind,
    /// Structured failure cause
    pub cause: FailureCause,
}

/// A highlight detected in the source video.
///
/// Created in bulk by the Analyze stage; `clip_ref`, `subtitle_ref`, `caption`
/// and `suggested_post_date` are populated progressively by later stages.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HighlightSegment {
    /// Position in the priority order returned by analysis (0-indexed)
    pub index: u32,

    /// Title suggested by the analysis provider
    pub title: String,

    /// Start offset into the source video, seconds
    pub start_secs: f64,

    /// End offset into the source video, seconds
    pub end_secs: f64,

    /// Ranking signal from the analysis provider. Used only for ordering and
    /// caption generation, never for control flow.
    pub score: f64,

    /// Why the provider thinks this moment is engaging
    pub rationale: String,

    /// Extracted clip artifact, set by the Extract stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_ref: Option<ArtifactRef>,

    /// Subtitle track artifact, set by the Subtitle stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_ref: Option<ArtifactRef>,

    /// Midpoint still frame, set by the Extract stage. Absent when the frame
    /// grab failed; a missing thumbnail never fails the segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_ref: Option<ArtifactRef>,

    /// Social caption, set by the Plan stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Suggested posting date (YYYY-MM-DD), set by the Plan stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_post_date: Option<String>,

    /// Failure record when extract or subtitle failed for this segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SegmentFailure>,
}

impl HighlightSegment {
    /// Create a new segment fresh out of analysis.
    pub fn new(
        index: u32,
        title: impl Into<String>,
        start_secs: f64,
        end_secs: f64,
        score: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            index,
            title: title.into(),
            start_secs,
            end_secs,
            score,
            rationale: rationale.into(),
            clip_ref: None,
            subtitle_ref: None,
            thumbnail_ref: None,
            caption: None,
            suggested_post_date: None,
            failure: None,
        }
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether this segment produced a usable clip.
    pub fn has_clip(&self) -> bool {
        self.clip_ref.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lifecycle_fields_start_empty() {
        let seg = HighlightSegment::new(0, "Opening", 1.0, 12.5, 0.9, "strong hook");
        assert!(seg.clip_ref.is_none());
        assert!(seg.subtitle_ref.is_none());
        assert!(seg.thumbnail_ref.is_none());
        assert!(seg.caption.is_none());
        assert!(seg.failure.is_none());
        assert!((seg.duration_secs() - 11.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_segment_failure_stage_serializes_snake_case() {
        let failure = SegmentFailure {
            stage: StageKind::Extract,
            cause: FailureCause::InvalidInput,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["stage"], "extract");
        assert_eq!(json["cause"], "invalid_input");
    }
}
