//! Analysis provider contract.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clipline_models::ProviderResult;

/// Hints passed to the provider about what the pipeline wants back.
#[derive(Debug, Clone)]
pub struct AnalyzeHints {
    /// Upper bound on returned highlights
    pub max_highlights: usize,
    /// Minimum usable clip length, seconds
    pub min_clip_seconds: f64,
    /// Maximum usable clip length, seconds
    pub max_clip_seconds: f64,
    /// Probed source duration, seconds
    pub source_duration_secs: f64,
}

impl Default for AnalyzeHints {
    fn default() -> Self {
        Self {
            max_highlights: 5,
            min_clip_seconds: 5.0,
            max_clip_seconds: 90.0,
            source_duration_secs: 0.0,
        }
    }
}

/// Candidate highlight as returned by the provider, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSegment {
    /// Start offset, seconds
    pub start_time: f64,
    /// End offset, seconds
    pub end_time: f64,
    /// Suggested title
    #[serde(default)]
    pub title: String,
    /// Ranking score in [0, 1]
    #[serde(default = "default_score")]
    pub score: f64,
    /// Why the provider picked this moment
    #[serde(default)]
    pub rationale: String,
}

fn default_score() -> f64 {
    0.5
}

/// External analysis capability.
///
/// Given a source video, returns candidate highlight moments in priority
/// order. One call per job; validation of the result is the Analyze stage's
/// responsibility, not the provider's.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(
        &self,
        video: &Path,
        hints: &AnalyzeHints,
    ) -> ProviderResult<Vec<CandidateSegment>>;
}
