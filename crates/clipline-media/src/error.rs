//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use clipline_models::ProviderError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}

impl From<MediaError> for ProviderError {
    /// Map toolchain failures into the capability taxonomy.
    ///
    /// FFmpeg failures are deterministic for a given input, so they classify
    /// as invalid input rather than transient. Timeouts and IO are worth a
    /// retry.
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Timeout(_) | MediaError::Io(_) => {
                ProviderError::transient(e.to_string())
            }
            MediaError::FfmpegNotFound | MediaError::FfprobeNotFound => {
                ProviderError::invalid_input(e.to_string())
            }
            MediaError::FfmpegFailed { .. }
            | MediaError::FfprobeFailed { .. }
            | MediaError::FileNotFound(_)
            | MediaError::InvalidVideo(_)
            | MediaError::JsonParse(_) => ProviderError::invalid_input(e.to_string()),
        }
    }
}
