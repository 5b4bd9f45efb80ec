//! Segment stage: fan-out planning.
//!
//! Turns a job's accepted highlight list into per-segment sub-job
//! descriptors. The orchestrator marks the job `Processing` and dispatches
//! these concurrently.

use clipline_models::VideoJob;

/// One per-segment unit of work for the Extract/Subtitle fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct SubJob {
    pub segment_index: u32,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Build the sub-job set for a segmented job.
pub fn plan_fanout(job: &VideoJob) -> Vec<SubJob> {
    job.highlights
        .iter()
        .map(|seg| SubJob {
            segment_index: seg.index,
            start_secs: seg.start_secs,
            end_secs: seg.end_secs,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipline_models::{ArtifactRef, HighlightSegment};

    #[test]
    fn test_fanout_one_subjob_per_segment() {
        let mut job = VideoJob::new(
            "t",
            "t.mp4",
            "video/mp4",
            ArtifactRef::new("sources/t.mp4"),
        );
        job.highlights = vec![
            HighlightSegment::new(0, "a", 0.0, 10.0, 0.9, "r"),
            HighlightSegment::new(1, "b", 20.0, 30.0, 0.8, "r"),
        ];

        let subjobs = plan_fanout(&job);
        assert_eq!(subjobs.len(), 2);
        assert_eq!(subjobs[1].segment_index, 1);
        assert_eq!(subjobs[1].start_secs, 20.0);
    }
}
