//! Analysis provider capability.
//!
//! This crate provides:
//! - The `AnalysisProvider` trait the pipeline consumes
//! - A Gemini HTTP implementation with model fallback
//! - Prompt construction and fenced-JSON response parsing

pub mod gemini;
pub mod prompt;
pub mod provider;

pub use gemini::{GeminiAnalyzer, GeminiClient};
pub use provider::{AnalysisProvider, AnalyzeHints, CandidateSegment};
