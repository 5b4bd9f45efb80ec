//! Deterministic artifact keys.

use clipline_models::{ArtifactKind, ArtifactRef, JobId};

/// Key derived from (job, segment, kind).
///
/// Source and plan artifacts are job-scoped; clips and subtitles carry the
/// segment index. Derivation happens exactly once per artifact, so two writers
/// can never target the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub job_id: JobId,
    pub segment_index: Option<u32>,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    /// Key for the job-scoped source video.
    pub fn source(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.clone(),
            segment_index: None,
            kind: ArtifactKind::Source,
        }
    }

    /// Key for a per-segment clip.
    pub fn clip(job_id: &JobId, segment_index: u32) -> Self {
        Self {
            job_id: job_id.clone(),
            segment_index: Some(segment_index),
            kind: ArtifactKind::Clip,
        }
    }

    /// Key for a per-segment subtitle track.
    pub fn subtitle(job_id: &JobId, segment_index: u32) -> Self {
        Self {
            job_id: job_id.clone(),
            segment_index: Some(segment_index),
            kind: ArtifactKind::Subtitle,
        }
    }

    /// Key for a per-segment thumbnail frame.
    pub fn thumbnail(job_id: &JobId, segment_index: u32) -> Self {
        Self {
            job_id: job_id.clone(),
            segment_index: Some(segment_index),
            kind: ArtifactKind::Thumbnail,
        }
    }

    /// Key for the job-scoped content plan document.
    pub fn plan(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.clone(),
            segment_index: None,
            kind: ArtifactKind::Plan,
        }
    }

    /// Render the storage key string.
    pub fn render(&self) -> String {
        match self.segment_index {
            Some(index) => format!(
                "{}/{}/{}.{}",
                self.kind.prefix(),
                self.job_id,
                index,
                self.kind.extension()
            ),
            None => format!(
                "{}/{}.{}",
                self.kind.prefix(),
                self.job_id,
                self.kind.extension()
            ),
        }
    }

    /// The ref this key resolves to.
    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef::new(self.render())
    }
}
