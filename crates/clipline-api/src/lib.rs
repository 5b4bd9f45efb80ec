//! Axum HTTP API server.
//!
//! This crate provides:
//! - Multipart video upload that queues a pipeline job
//! - Job status, video/highlight/content-plan reads
//! - Clip, subtitle and thumbnail downloads
//! - Cancel and delete
//! - One-shot publish stubs for YouTube and Instagram

pub mod config;
pub mod error;
pub mod handlers;
pub mod publish;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
