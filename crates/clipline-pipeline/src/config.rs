//! Pipeline configuration.

use std::time::Duration;

use clipline_media::ClipFormat;

use crate::retry::RetryPolicy;

/// Limits and policy for the Analyze stage.
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    /// Upper bound on accepted highlights per job
    pub max_highlights: usize,
    /// Candidates shorter than this are dropped
    pub min_clip_seconds: f64,
    /// Candidates longer than this are clamped to this length
    pub max_clip_seconds: f64,
    /// Allowed overlap with a higher-priority accepted candidate
    pub overlap_tolerance_secs: f64,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            max_highlights: 5,
            min_clip_seconds: 5.0,
            max_clip_seconds: 90.0,
            overlap_tolerance_secs: 2.0,
        }
    }
}

/// Pipeline-wide configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum jobs processed concurrently
    pub max_concurrent_jobs: usize,
    /// Maximum concurrent Extract/Subtitle sub-jobs within one job
    pub max_segment_parallel: usize,
    /// Analyze stage policy
    pub analyze: AnalyzeConfig,
    /// Retry policy for provider calls
    pub retry: RetryPolicy,
    /// Output format policy for extracted clips
    pub clip_format: ClipFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            max_segment_parallel: 4,
            analyze: AnalyzeConfig::default(),
            retry: RetryPolicy::default(),
            clip_format: ClipFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_parse("PIPELINE_MAX_JOBS", defaults.max_concurrent_jobs),
            max_segment_parallel: env_parse(
                "PIPELINE_MAX_SEGMENT_PARALLEL",
                defaults.max_segment_parallel,
            ),
            analyze: AnalyzeConfig {
                max_highlights: env_parse("ANALYZE_MAX_HIGHLIGHTS", defaults.analyze.max_highlights),
                min_clip_seconds: env_parse(
                    "ANALYZE_MIN_CLIP_SECONDS",
                    defaults.analyze.min_clip_seconds,
                ),
                max_clip_seconds: env_parse(
                    "ANALYZE_MAX_CLIP_SECONDS",
                    defaults.analyze.max_clip_seconds,
                ),
                overlap_tolerance_secs: env_parse(
                    "ANALYZE_OVERLAP_TOLERANCE_SECS",
                    defaults.analyze.overlap_tolerance_secs,
                ),
            },
            retry: RetryPolicy::new(
                env_parse("RETRY_MAX_RETRIES", defaults.retry.max_retries),
                Duration::from_millis(env_parse(
                    "RETRY_BASE_DELAY_MS",
                    defaults.retry.base_delay.as_millis() as u64,
                )),
                Duration::from_secs(env_parse(
                    "RETRY_MAX_DELAY_SECS",
                    defaults.retry.max_delay.as_secs(),
                )),
            ),
            clip_format: defaults.clip_format,
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
