//! Export types and configuration
//!
//! This module defines the types used for video export configuration,
//! progress tracking, and error handling.

use crate::capture::Resolution;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Mp4,
    Webm,
}

impl ExportFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Mp4 => "mp4",
            ExportFormat::Webm => "webm",
        }
    }

    /// Get the FFmpeg video codec for this format
    pub fn video_codec(&self) -> &'static str {
        match self {
            ExportFormat::Mp4 => "libx264",
            ExportFormat::Webm => "libvpx-vp9",
        }
    }
}

/// Export quality levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    Low,
    Medium,
    High,
}

impl ExportQuality {
    /// Get the CRF value for H.264/VP9 encoding
    /// Lower values = higher quality, larger files
    pub fn crf(&self) -> u8 {
        match self {
            ExportQuality::Low => 28,
            ExportQuality::Medium => 23,
            ExportQuality::High => 18,
        }
    }

    /// Get the FFmpeg preset for H.264 encoding
    pub fn h264_preset(&self) -> &'static str {
        match self {
            ExportQuality::Low => "faster",
            ExportQuality::Medium => "medium",
            ExportQuality::High => "slow",
        }
    }
}

/// Everything an encoder needs to open its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub output_path: PathBuf,
    /// Composite frame size
    pub resolution: Resolution,
    pub fps: u32,
    pub format: ExportFormat,
    pub quality: ExportQuality,
}

/// Summary of a finished export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    /// Recording session this video belongs to
    pub session_id: Uuid,
    /// Written video file
    pub output_path: PathBuf,
    /// Frames handed to the encoder
    pub frame_count: u64,
    /// Composite frame size
    pub resolution: Resolution,
    pub fps: u32,
}

/// Export progress stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ExportStage {
    /// Creating the output directory and opening the encoder
    Preparing,
    /// Rendering and encoding composite frames
    Encoding,
    /// Flushing the encoder
    Finalizing,
    /// Export completed successfully
    Complete,
    /// Export failed with error
    Error { message: String },
}

/// Export progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    /// Progress percentage (0.0 to 100.0)
    pub percent: f32,
    /// Current stage of export
    pub stage: ExportStage,
    /// Current frame being processed
    pub current_frame: u64,
    /// Total frames to process
    pub total_frames: u64,
}

impl ExportProgress {
    pub fn preparing(total_frames: u64) -> Self {
        Self {
            percent: 0.0,
            stage: ExportStage::Preparing,
            current_frame: 0,
            total_frames,
        }
    }

    pub fn encoding(current_frame: u64, total_frames: u64) -> Self {
        let percent = if total_frames > 0 {
            5.0 + (current_frame as f32 / total_frames as f32) * 90.0
        } else {
            5.0
        };
        Self {
            percent,
            stage: ExportStage::Encoding,
            current_frame,
            total_frames,
        }
    }

    pub fn finalizing(total_frames: u64) -> Self {
        Self {
            percent: 95.0,
            stage: ExportStage::Finalizing,
            current_frame: total_frames,
            total_frames,
        }
    }

    pub fn complete(total_frames: u64) -> Self {
        Self {
            percent: 100.0,
            stage: ExportStage::Complete,
            current_frame: total_frames,
            total_frames,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            percent: 0.0,
            stage: ExportStage::Error { message },
            current_frame: 0,
            total_frames: 0,
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open encoder: {0}")]
    EncoderOpen(String),

    #[error("Frame {index} is {actual}, expected {expected}")]
    FrameSizeMismatch {
        index: usize,
        expected: Resolution,
        actual: Resolution,
    },

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extension() {
        assert_eq!(ExportFormat::Mp4.extension(), "mp4");
        assert_eq!(ExportFormat::Webm.video_codec(), "libvpx-vp9");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(ExportProgress::encoding(0, 10).percent, 5.0);
        assert_eq!(ExportProgress::encoding(10, 10).percent, 95.0);
        assert_eq!(ExportProgress::complete(10).percent, 100.0);
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&ExportProgress::error("boom".into())).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains("boom"));
    }
}
