//! Prompt construction for the analysis provider.

use crate::provider::AnalyzeHints;

/// Build the highlight-detection prompt.
pub fn build_analysis_prompt(hints: &AnalyzeHints) -> String {
    format!(
        r#"You are a video analysis AI. Identify the most engaging moments in the
video that would make good highlight clips for social media.

The video is {duration:.1} seconds long.

Identify up to {max} highlight moments. Each highlight must be between
{min:.0} and {max_len:.0} seconds long and fit entirely inside the video.
For each highlight:
1. Pick start and end times at natural breaks in the content
2. Create a short title
3. Score how engaging it is, from 0.0 to 1.0
4. Explain why this moment would perform well

Return ONLY a JSON object with this schema:
{{
  "highlighted_moments": [
    {{
      "start_time": 0.0,
      "end_time": 0.0,
      "title": "Title",
      "score": 0.0,
      "rationale": "Why this moment is engaging"
    }}
  ]
}}"#,
        duration = hints.source_duration_secs,
        max = hints.max_highlights,
        min = hints.min_clip_seconds,
        max_len = hints.max_clip_seconds,
    )
}

/// Strip a markdown code fence from a model response, if present.
///
/// Models frequently wrap JSON in ```json fences even when asked not to.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_prompt_mentions_bounds() {
        let hints = AnalyzeHints {
            max_highlights: 3,
            min_clip_seconds: 10.0,
            max_clip_seconds: 45.0,
            source_duration_secs: 300.0,
        };
        let prompt = build_analysis_prompt(&hints);
        assert!(prompt.contains("up to 3"));
        assert!(prompt.contains("300.0 seconds"));
    }
}
