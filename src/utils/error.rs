//! Error types and handling
//!
//! Common error types used across the recorder.

use crate::export::ExportError;
use crate::recorder::RecordingState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recorder-wide error type
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Export failed ({retained_frames} frames retained): {source}")]
    Export {
        #[source]
        source: ExportError,
        retained_frames: usize,
    },

    #[error("Not allowed while {0:?}")]
    Busy(RecordingState),

    #[error("No background runtime configured")]
    NoRuntime,

    #[error("Background export task failed: {0}")]
    TaskFailed(String),
}

/// Error response for UI surfaces
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<RecorderError> for ErrorResponse {
    fn from(error: RecorderError) -> Self {
        let code = match &error {
            RecorderError::Export { source, .. } => match source {
                ExportError::DirectoryCreate { .. } => "DIRECTORY_CREATE_FAILED",
                ExportError::EncoderOpen(_) => "ENCODER_OPEN_FAILED",
                _ => "EXPORT_ERROR",
            },
            RecorderError::Busy(_) => "BUSY",
            RecorderError::NoRuntime => "NO_RUNTIME",
            RecorderError::TaskFailed(_) => "TASK_FAILED",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using RecorderError
pub type RecorderResult<T> = Result<T, RecorderError>;
