//! Media toolchain contract and the FFmpeg-backed implementation.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clipline_analysis::gemini::GeminiClient;
use clipline_models::{ProviderError, ProviderResult};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::probe::probe_video;
use crate::vtt::{build_transcribe_prompt, normalize_webvtt};

/// Output policy for extracted clips: social vertical format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipFormat {
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub crf: u8,
    pub preset: String,
}

impl Default for ClipFormat {
    fn default() -> Self {
        // 9:16 for Reels/Shorts/TikTok
        Self {
            width: 1080,
            height: 1920,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            crf: 23,
            preset: "veryfast".to_string(),
        }
    }
}

impl ClipFormat {
    /// Scale-and-crop filter that fills the target frame.
    pub fn scale_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
            w = self.width,
            h = self.height
        )
    }
}

/// External media capability: extraction and transcription.
///
/// Failures are reported through the shared provider taxonomy so the
/// orchestrator can apply a uniform retry policy.
#[async_trait]
pub trait MediaToolchain: Send + Sync {
    /// Cut `[start_secs, end_secs)` out of `source` and re-encode it to the
    /// social output format, returning the clip bytes.
    async fn extract_clip(
        &self,
        source: &Path,
        start_secs: f64,
        end_secs: f64,
        format: &ClipFormat,
    ) -> ProviderResult<Vec<u8>>;

    /// Grab a single still frame from `source` at `at_secs`, returning JPEG
    /// bytes.
    async fn extract_thumbnail(&self, source: &Path, at_secs: f64) -> ProviderResult<Vec<u8>>;

    /// Produce a WebVTT subtitle track for an extracted clip.
    async fn transcribe(&self, clip: &Path) -> ProviderResult<String>;
}

/// Thumbnails are downscaled to this width; height follows the aspect ratio.
const THUMBNAIL_SCALE_WIDTH: u32 = 480;

/// Production toolchain: FFmpeg for extraction, Gemini for transcription.
pub struct FfmpegToolchain {
    transcriber: GeminiClient,
    /// Hard cap on a single FFmpeg invocation
    ffmpeg_timeout_secs: u64,
}

impl FfmpegToolchain {
    pub fn new(transcriber: GeminiClient) -> Self {
        Self {
            transcriber,
            ffmpeg_timeout_secs: 600,
        }
    }

    pub fn with_ffmpeg_timeout(mut self, secs: u64) -> Self {
        self.ffmpeg_timeout_secs = secs;
        self
    }
}

#[async_trait]
impl MediaToolchain for FfmpegToolchain {
    async fn extract_clip(
        &self,
        source: &Path,
        start_secs: f64,
        end_secs: f64,
        format: &ClipFormat,
    ) -> ProviderResult<Vec<u8>> {
        if !source.exists() {
            return Err(ProviderError::invalid_input(format!(
                "source video missing: {}",
                source.display()
            )));
        }
        if end_secs <= start_secs {
            return Err(ProviderError::invalid_input(format!(
                "zero-duration clip requested: {start_secs}..{end_secs}"
            )));
        }

        let scratch = tempfile::tempdir().map_err(|e| ProviderError::transient(e.to_string()))?;
        let output = scratch.path().join("clip.mp4");

        let cmd = FfmpegCommand::new(source, &output)
            .seek(start_secs)
            .duration(end_secs - start_secs)
            .video_filter(format.scale_filter())
            .video_codec(&format.video_codec)
            .audio_codec(&format.audio_codec)
            .crf(format.crf)
            .preset(&format.preset);

        FfmpegRunner::new()
            .with_timeout(self.ffmpeg_timeout_secs)
            .run(&cmd)
            .await?;

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| ProviderError::transient(format!("clip readback failed: {e}")))?;

        debug!(
            source = %source.display(),
            start_secs,
            end_secs,
            size = bytes.len(),
            "Extracted clip"
        );
        Ok(bytes)
    }

    async fn extract_thumbnail(&self, source: &Path, at_secs: f64) -> ProviderResult<Vec<u8>> {
        if !source.exists() {
            return Err(ProviderError::invalid_input(format!(
                "source video missing: {}",
                source.display()
            )));
        }

        let scratch = tempfile::tempdir().map_err(|e| ProviderError::transient(e.to_string()))?;
        let output = scratch.path().join("thumb.jpg");

        let filter = format!("scale={THUMBNAIL_SCALE_WIDTH}:-2");
        let cmd = FfmpegCommand::new(source, &output)
            .seek(at_secs)
            .single_frame()
            .video_filter(filter);

        FfmpegRunner::new()
            .with_timeout(self.ffmpeg_timeout_secs)
            .run(&cmd)
            .await?;

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| ProviderError::transient(format!("thumbnail readback failed: {e}")))?;

        debug!(source = %source.display(), at_secs, size = bytes.len(), "Extracted thumbnail");
        Ok(bytes)
    }

    async fn transcribe(&self, clip: &Path) -> ProviderResult<String> {
        let info = probe_video(clip).await?;
        let prompt = build_transcribe_prompt(info.duration);
        let raw = self.transcriber.generate(&prompt).await?;
        Ok(normalize_webvtt(&raw))
    }
}
