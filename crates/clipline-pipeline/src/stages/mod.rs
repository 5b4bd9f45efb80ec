//! Stage executors.
//!
//! Each stage is a transformation from job inputs plus capability providers
//! to produced artifacts or a typed [`StageFailure`](crate::StageFailure).
//! Executors never touch the registry; persisting results is the
//! orchestrator's job.

pub mod analyze;
pub mod extract;
pub mod plan;
pub mod segment;
pub mod subtitle;

pub use analyze::AnalyzeStage;
pub use extract::{ExtractStage, ExtractedClip};
pub use plan::PlanStage;
pub use segment::{plan_fanout, SubJob};
pub use subtitle::SubtitleStage;
