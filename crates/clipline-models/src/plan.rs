//! Content plan models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{ArtifactRef, JobId};

/// One scheduled post in a content plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentPlanEntry {
    /// Index of the highlight segment this entry was built from
    pub segment_index: u32,

    /// Clip to post
    pub clip_ref: ArtifactRef,

    /// Social caption
    pub caption: String,

    /// Suggested hashtags
    #[serde(default)]
    pub hashtags: Vec<String>,

    /// Suggested posting date (YYYY-MM-DD)
    pub suggested_post_date: String,
}

/// Content plan produced by the Plan stage, one per job.
///
/// Entries exist only for segments that completed both Extract and Subtitle;
/// failed segments are omitted, never null-padded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentPlan {
    /// Owning job
    pub job_id: JobId,

    /// Plan title
    pub title: String,

    /// When the plan was generated
    pub generated_at: DateTime<Utc>,

    /// Scheduled posts in segment priority order
    pub entries: Vec<ContentPlanEntry>,
}

impl ContentPlan {
    pub fn new(job_id: JobId, entries: Vec<ContentPlanEntry>) -> Self {
        Self {
            title: format!("Content plan for {} highlights", entries.len()),
            job_id,
            generated_at: Utc::now(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_title_counts_entries() {
        let entry = ContentPlanEntry {
            segment_index: 0,
            clip_ref: ArtifactRef::new("clips/a/0.mp4"),
            caption: "Check this out".to_string(),
            hashtags: vec!["#video".to_string()],
            suggested_post_date: "2026-01-02".to_string(),
        };
        let plan = ContentPlan::new(JobId::new(), vec![entry]);
        assert_eq!(plan.title, "Content plan for 1 highlights");
        assert_eq!(plan.entries.len(), 1);
    }
}
