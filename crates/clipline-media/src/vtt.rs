//! WebVTT helpers for the subtitle transcriber.

/// Build the transcription prompt for a clip of known length.
pub fn build_transcribe_prompt(duration_secs: f64) -> String {
    format!(
        r#"You are a subtitle generation AI. Create subtitles for a video clip
that is {duration_secs:.1} seconds long. The clip is a highlight from a longer
video.

Format your response as WebVTT, with appropriate timestamps, for example:

WEBVTT

00:00:00.000 --> 00:00:02.500
Hello, welcome to this video!

Cover the entire {duration_secs:.1} second duration. Respond with ONLY the
WebVTT content, nothing else."#
    )
}

/// Normalize a model response into a valid WebVTT document.
///
/// Strips markdown fences and guarantees the `WEBVTT` header.
pub fn normalize_webvtt(text: &str) -> String {
    let mut body = text.trim();

    if let Some(stripped) = body.strip_prefix("```vtt") {
        body = stripped;
    } else if let Some(stripped) = body.strip_prefix("```") {
        body = stripped;
    }
    if let Some(stripped) = body.strip_suffix("```") {
        body = stripped;
    }
    let body = body.trim();

    if body.starts_with("WEBVTT") {
        body.to_string()
    } else {
        format!("WEBVTT\n\n{body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_header() {
        let vtt = normalize_webvtt("00:00:00.000 --> 00:00:02.000\nHi");
        assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000"));
    }

    #[test]
    fn test_normalize_strips_fence_and_keeps_header() {
        let vtt = normalize_webvtt("```vtt\nWEBVTT\n\n00:00:00.000 --> 00:00:01.000\nHi\n```");
        assert!(vtt.starts_with("WEBVTT"));
        assert!(!vtt.contains("```"));
    }
}
