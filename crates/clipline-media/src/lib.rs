//! Media toolchain for the Clipline pipeline.
//!
//! This crate provides:
//! - The `MediaToolchain` trait (clip extraction, subtitle transcription)
//! - An FFmpeg command builder and runner
//! - FFprobe video inspection
//! - A production toolchain backed by FFmpeg + the Gemini transcriber

pub mod command;
pub mod error;
pub mod probe;
pub mod toolchain;
pub mod vtt;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use toolchain::{ClipFormat, FfmpegToolchain, MediaToolchain};
