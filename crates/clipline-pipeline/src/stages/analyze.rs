//! Analyze stage: one provider call per job, then candidate validation.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use clipline_analysis::{AnalysisProvider, AnalyzeHints, CandidateSegment};
use clipline_models::{
    overlap_secs, validate_range, FailureCause, HighlightSegment, StageKind,
};

use crate::config::AnalyzeConfig;
use crate::error::StageFailure;
use crate::retry::{call_with_retry, RetryPolicy};

/// Executor for the Analyze stage.
pub struct AnalyzeStage {
    provider: Arc<dyn AnalysisProvider>,
    config: AnalyzeConfig,
    retry: RetryPolicy,
}

impl AnalyzeStage {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        config: AnalyzeConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            config,
            retry,
        }
    }

    /// Run analysis on the source video.
    ///
    /// Returns the accepted highlight segments in priority order, or
    /// `NoHighlightsFound` when nothing survives validation. No artifacts are
    /// written by this stage.
    pub async fn execute(
        &self,
        source: &Path,
        source_duration_secs: f64,
    ) -> Result<Vec<HighlightSegment>, StageFailure> {
        let hints = AnalyzeHints {
            max_highlights: self.config.max_highlights,
            min_clip_seconds: self.config.min_clip_seconds,
            max_clip_seconds: self.config.max_clip_seconds,
            source_duration_secs,
        };

        let candidates = call_with_retry(&self.retry, "analyze", || {
            self.provider.analyze(source, &hints)
        })
        .await
        .map_err(|(e, exhausted)| StageFailure::from_provider(StageKind::Analyze, &e, exhausted))?;

        let accepted = validate_candidates(candidates, &self.config, source_duration_secs);

        if accepted.is_empty() {
            // Zero candidates is a valid analysis outcome, not a bug.
            return Err(StageFailure::new(
                StageKind::Analyze,
                FailureCause::NoHighlightsFound,
            ));
        }

        info!(count = accepted.len(), "Analysis accepted highlights");
        Ok(accepted)
    }
}

/// Validate provider candidates against the time-bounds and overlap policy.
///
/// Candidates arrive in priority order; earlier candidates win overlap
/// conflicts. Overlong candidates are clamped to the max clip length rather
/// than dropped.
pub fn validate_candidates(
    candidates: Vec<CandidateSegment>,
    config: &AnalyzeConfig,
    source_duration_secs: f64,
) -> Vec<HighlightSegment> {
    let mut accepted: Vec<HighlightSegment> = Vec::new();

    for candidate in candidates {
        if accepted.len() >= config.max_highlights {
            break;
        }

        let start = candidate.start_time;
        let end = candidate
            .end_time
            .min(start + config.max_clip_seconds);

        if let Err(e) = validate_range(start, end, source_duration_secs) {
            debug!("Dropping candidate '{}': {}", candidate.title, e);
            continue;
        }

        if end - start < config.min_clip_seconds {
            debug!(
                "Dropping candidate '{}': shorter than {}s",
                candidate.title, config.min_clip_seconds
            );
            continue;
        }

        let overlaps = accepted.iter().any(|seg| {
            overlap_secs((seg.start_secs, seg.end_secs), (start, end))
                > config.overlap_tolerance_secs
        });
        if overlaps {
            debug!(
                "Dropping candidate '{}': overlaps an accepted highlight",
                candidate.title
            );
            continue;
        }

        let index = accepted.len() as u32;
        let title = if candidate.title.is_empty() {
            format!("Highlight {}", index + 1)
        } else {
            candidate.title
        };
        accepted.push(HighlightSegment::new(
            index,
            title,
            start,
            end,
            candidate.score,
            candidate.rationale,
        ));
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(start: f64, end: f64) -> CandidateSegment {
        CandidateSegment {
            start_time: start,
            end_time: end,
            title: String::new(),
            score: 0.5,
            rationale: "r".to_string(),
        }
    }

    fn config() -> AnalyzeConfig {
        AnalyzeConfig {
            max_highlights: 3,
            min_clip_seconds: 5.0,
            max_clip_seconds: 60.0,
            overlap_tolerance_secs: 2.0,
        }
    }

    #[test]
    fn test_out_of_bounds_candidates_dropped() {
        let accepted = validate_candidates(
            vec![
                candidate(-1.0, 10.0),  // negative start
                candidate(50.0, 40.0),  // inverted
                candidate(90.0, 130.0), // past end of 100s video
                candidate(0.0, 10.0),   // fine
            ],
            &config(),
            100.0,
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].start_secs, 0.0);
    }

    #[test]
    fn test_short_candidates_dropped_long_ones_clamped() {
        let accepted = validate_candidates(
            vec![candidate(0.0, 3.0), candidate(10.0, 95.0)],
            &config(),
            100.0,
        );
        assert_eq!(accepted.len(), 1);
        // Clamped to max_clip_seconds
        assert_eq!(accepted[0].end_secs, 70.0);
    }

    #[test]
    fn test_overlap_beyond_tolerance_dropped() {
        let accepted = validate_candidates(
            vec![
                candidate(0.0, 20.0),
                candidate(15.0, 35.0), // 5s overlap with the first, > 2s tolerance
                candidate(19.0, 40.0), // 1s overlap, within tolerance
            ],
            &config(),
            100.0,
        );
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[1].start_secs, 19.0);
    }

    #[test]
    fn test_priority_order_and_truncation() {
        let accepted = validate_candidates(
            vec![
                candidate(0.0, 10.0),
                candidate(20.0, 30.0),
                candidate(40.0, 50.0),
                candidate(60.0, 70.0),
            ],
            &config(),
            100.0,
        );
        assert_eq!(accepted.len(), 3);
        let indices: Vec<_> = accepted.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
