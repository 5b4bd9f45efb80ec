//! The Clipline processing pipeline.
//!
//! This crate provides:
//! - The job registry (per-job exclusive access, transition enforcement)
//! - The orchestrator (submit/status/cancel/delete, worker pool,
//!   per-segment fan-out/fan-in with bounded parallelism)
//! - The five stage executors (Analyze, Segment, Extract, Subtitle, Plan)
//! - Retry with exponential backoff for transient provider failures

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod retry;
pub mod stages;

pub use config::{AnalyzeConfig, PipelineConfig};
pub use error::{PipelineError, PipelineResult, StageFailure};
pub use orchestrator::Orchestrator;
pub use registry::JobRegistry;
pub use retry::RetryPolicy;
