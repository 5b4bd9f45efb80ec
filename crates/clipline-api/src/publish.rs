//! One-shot publishing to social platforms.
//!
//! Publishing sits outside the pipeline core: it consumes artifacts from
//! completed jobs on demand and never touches job state. The current
//! implementation is a stub that acknowledges the request with a pending
//! receipt; real platform uploads plug in behind the [`Publisher`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use clipline_models::{ArtifactRef, JobId};

/// Target platform for a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
        }
    }
}

/// Receipt returned for an accepted publish request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub platform: Platform,
    pub job_id: JobId,
    pub segment_index: u32,
    /// Always "pending" until a real uploader is wired in
    pub status: String,
    pub submitted_at: DateTime<Utc>,
}

/// Platform upload capability.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Submit one clip for publishing. The clip is referenced, not copied.
    async fn publish(
        &self,
        platform: Platform,
        job_id: &JobId,
        segment_index: u32,
        clip_ref: &ArtifactRef,
        caption: Option<&str>,
    ) -> PublishReceipt;
}

/// Accepts every request and reports it as pending.
pub struct StubPublisher;

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(
        &self,
        platform: Platform,
        job_id: &JobId,
        segment_index: u32,
        clip_ref: &ArtifactRef,
        caption: Option<&str>,
    ) -> PublishReceipt {
        info!(
            job_id = %job_id,
            segment = segment_index,
            platform = platform.as_str(),
            clip = %clip_ref,
            caption = caption.unwrap_or(""),
            "Publish requested (stub)"
        );
        PublishReceipt {
            platform,
            job_id: job_id.clone(),
            segment_index,
            status: "pending".to_string(),
            submitted_at: Utc::now(),
        }
    }
}
