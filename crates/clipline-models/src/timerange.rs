//! Time range validation for highlight segments.
//!
//! Segment offsets are seconds into the source video. A valid range satisfies
//! `0 <= start < end <= source_duration`.

use thiserror::Error;

/// Maximum reasonable video duration (24 hours in seconds).
pub const MAX_VIDEO_DURATION_SECS: f64 = 86400.0;

/// Errors produced by time range validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeRangeError {
    #[error("start offset is negative: {0}")]
    NegativeStart(f64),

    #[error("start {start} is not before end {end}")]
    StartNotBeforeEnd { start: f64, end: f64 },

    #[error("end {end} exceeds source duration {duration}")]
    ExceedsDuration { end: f64, duration: f64 },

    #[error("range exceeds maximum duration of {MAX_VIDEO_DURATION_SECS} seconds")]
    ExceedsMaxDuration,
}

/// Validate a `[start, end)` range against the source duration.
pub fn validate_range(start: f64, end: f64, source_duration: f64) -> Result<(), TimeRangeError> {
    if start < 0.0 {
        return Err(TimeRangeError::NegativeStart(start));
    }
    if start >= end {
        return Err(TimeRangeError::StartNotBeforeEnd { start, end });
    }
    if end > source_duration {
        return Err(TimeRangeError::ExceedsDuration {
            end,
            duration: source_duration,
        });
    }
    if end > MAX_VIDEO_DURATION_SECS {
        return Err(TimeRangeError::ExceedsMaxDuration);
    }
    Ok(())
}

/// Overlap in seconds between two `[start, end)` ranges. Zero when disjoint.
pub fn overlap_secs(a: (f64, f64), b: (f64, f64)) -> f64 {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    (end - start).max(0.0)
}

/// Format an offset as a WebVTT timestamp (`HH:MM:SS.mmm`).
pub fn format_vtt_timestamp(total_secs: f64) -> String {
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        assert!(validate_range(0.0, 10.0, 60.0).is_ok());
        assert!(validate_range(5.5, 6.0, 60.0).is_ok());
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(
            validate_range(-1.0, 10.0, 60.0),
            Err(TimeRangeError::NegativeStart(_))
        ));
        assert!(matches!(
            validate_range(10.0, 10.0, 60.0),
            Err(TimeRangeError::StartNotBeforeEnd { .. })
        ));
        assert!(matches!(
            validate_range(0.0, 61.0, 60.0),
            Err(TimeRangeError::ExceedsDuration { .. })
        ));
    }

    #[test]
    fn test_overlap() {
        assert_eq!(overlap_secs((0.0, 10.0), (5.0, 15.0)), 5.0);
        assert_eq!(overlap_secs((0.0, 10.0), (10.0, 15.0)), 0.0);
        assert_eq!(overlap_secs((0.0, 10.0), (20.0, 30.0)), 0.0);
    }

    #[test]
    fn test_vtt_timestamp() {
        assert_eq!(format_vtt_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_vtt_timestamp(5400.5), "01:30:00.500");
    }
}
