//! Plan stage: content plan synthesis.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::info;

use clipline_models::{ArtifactRef, ContentPlan, ContentPlanEntry, FailureCause, StageKind, VideoJob};
use clipline_storage::{ArtifactKey, ArtifactStore};

use crate::error::StageFailure;

/// Executor for content plan synthesis.
///
/// Pure local computation over the job record plus one storage write for the
/// plan document. No provider calls, so no retry policy.
pub struct PlanStage {
    store: Arc<dyn ArtifactStore>,
}

impl PlanStage {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Build the plan for a job and persist the plan document.
    pub async fn execute(
        &self,
        job: &VideoJob,
    ) -> Result<(ContentPlan, ArtifactRef), StageFailure> {
        let plan = build_plan(job, Utc::now().date_naive());

        let document = serde_json::to_vec_pretty(&plan)
            .map_err(|_| StageFailure::new(StageKind::Plan, FailureCause::Internal))?;
        let key = ArtifactKey::plan(&job.id);
        let plan_ref = self
            .store
            .put(&key, &document)
            .await
            .map_err(|_| StageFailure::new(StageKind::Plan, FailureCause::Internal))?;

        info!(job_id = %job.id, entries = plan.entries.len(), "Built content plan");
        Ok((plan, plan_ref))
    }
}

/// Build a content plan from a job's fully processed segments.
///
/// Entries cover only segments holding both a clip and a subtitle track, in
/// segment priority order. Posting dates start the day after `start_date` and
/// advance one day per entry.
pub fn build_plan(job: &VideoJob, start_date: NaiveDate) -> ContentPlan {
    let entries = job
        .fully_processed_segments()
        .enumerate()
        .filter_map(|(slot, seg)| {
            let clip_ref = seg.clip_ref.clone()?;
            let post_date = start_date + Duration::days(slot as i64 + 1);
            Some(ContentPlanEntry {
                segment_index: seg.index,
                clip_ref,
                caption: build_caption(&seg.title, &seg.rationale),
                hashtags: build_hashtags(seg.index),
                suggested_post_date: post_date.format("%Y-%m-%d").to_string(),
            })
        })
        .collect();

    ContentPlan::new(job.id.clone(), entries)
}

fn build_caption(title: &str, rationale: &str) -> String {
    if rationale.is_empty() {
        format!("Check out this highlight: {title}.")
    } else {
        format!("Check out this highlight: {title}. {rationale}")
    }
}

fn build_hashtags(segment_index: u32) -> Vec<String> {
    vec![
        "#video".to_string(),
        "#highlights".to_string(),
        "#content".to_string(),
        format!("#part{}", segment_index + 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipline_models::{HighlightSegment, SegmentFailure};

    fn processed_segment(index: u32, title: &str) -> HighlightSegment {
        let mut seg = HighlightSegment::new(index, title, 0.0, 10.0, 0.9, "great pacing");
        seg.clip_ref = Some(ArtifactRef::new(format!("clips/j/{index}.mp4")));
        seg.subtitle_ref = Some(ArtifactRef::new(format!("subtitles/j/{index}.vtt")));
        seg
    }

    fn job_with(segments: Vec<HighlightSegment>) -> VideoJob {
        let mut job = VideoJob::new("t", "t.mp4", "video/mp4", ArtifactRef::new("sources/t.mp4"));
        job.highlights = segments;
        job
    }

    #[test]
    fn test_plan_covers_fully_processed_segments_only() {
        let mut failed = HighlightSegment::new(1, "b", 20.0, 30.0, 0.8, "r");
        failed.failure = Some(SegmentFailure {
            stage: StageKind::Extract,
            cause: FailureCause::InvalidInput,
        });

        let mut no_subs = processed_segment(2, "c");
        no_subs.subtitle_ref = None;

        let job = job_with(vec![processed_segment(0, "a"), failed, no_subs]);
        let plan = build_plan(&job, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].segment_index, 0);
    }

    #[test]
    fn test_posting_dates_advance_one_day_per_entry() {
        let job = job_with(vec![
            processed_segment(0, "a"),
            processed_segment(1, "b"),
            processed_segment(2, "c"),
        ]);
        let plan = build_plan(&job, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        let dates: Vec<_> = plan
            .entries
            .iter()
            .map(|e| e.suggested_post_date.as_str())
            .collect();
        assert_eq!(dates, vec!["2026-01-02", "2026-01-03", "2026-01-04"]);
    }

    #[test]
    fn test_caption_and_hashtags() {
        let job = job_with(vec![processed_segment(3, "Big reveal")]);
        let plan = build_plan(&job, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        let entry = &plan.entries[0];
        assert_eq!(
            entry.caption,
            "Check out this highlight: Big reveal. great pacing"
        );
        assert!(entry.hashtags.contains(&"#part4".to_string()));
    }

    #[test]
    fn test_empty_plan_for_no_processed_segments() {
        let job = job_with(vec![]);
        let plan = build_plan(&job, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(plan.entries.is_empty());
    }
}
