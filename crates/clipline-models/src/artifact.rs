//! Artifact references and kinds.
//!
//! The artifact store owns raw bytes; everything else holds `ArtifactRef`
//! handles. Refs are derived deterministically from (job, segment, kind) so
//! concurrent sub-jobs never race on the same key.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Uploaded source video
    Source,
    /// Extracted, re-encoded highlight clip
    Clip,
    /// WebVTT subtitle track for a clip
    Subtitle,
    /// Midpoint still frame for a clip
    Thumbnail,
    /// Content plan JSON document
    Plan,
}

impl ArtifactKind {
    /// Directory prefix used in storage keys.
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Source => "sources",
            ArtifactKind::Clip => "clips",
            ArtifactKind::Subtitle => "subtitles",
            ArtifactKind::Thumbnail => "thumbnails",
            ArtifactKind::Plan => "plans",
        }
    }

    /// File extension for the artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Source => "mp4",
            ArtifactKind::Clip => "mp4",
            ArtifactKind::Subtitle => "vtt",
            ArtifactKind::Thumbnail => "jpg",
            ArtifactKind::Plan => "json",
        }
    }
}

/// Opaque handle to a stored artifact.
///
/// The inner string is the storage key. Only the artifact store interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
