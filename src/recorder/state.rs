//! Recording state management
//!
//! Defines the recording state machine and session tracking.

use crate::capture::Resolution;
use crate::export::ExportReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    #[default]
    Idle,
    /// Capturing frames into the buffer
    Recording,
    /// A stopped recording is being encoded in the background
    Exporting,
}

/// Bookkeeping for one start/stop cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSession {
    /// Unique session id
    pub id: Uuid,

    /// Wall-clock start time
    pub started_at: DateTime<Utc>,

    /// Size of the first accepted frame; later frames must match it
    pub resolution: Option<Resolution>,

    /// Frames appended to the buffer
    pub captured: u64,

    /// Capture slots where the source had nothing to give
    pub skipped: u64,

    /// Frames dropped because their size differed from `resolution`
    pub rejected: u64,

    /// Capture slots dropped by the per-tick catch-up limit
    pub throttled: u64,
}

impl RecordingSession {
    /// Create a new session starting now
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            resolution: None,
            captured: 0,
            skipped: 0,
            rejected: 0,
            throttled: 0,
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// What a stop request did
#[derive(Debug, Clone)]
pub enum StopOutcome {
    /// Nothing was recording
    NotRecording,
    /// Recording stopped with no frames; no file written
    Empty,
    /// Video written
    Exported(ExportReport),
    /// Encoding continues on a background worker
    ExportStarted,
}

impl StopOutcome {
    /// The written video, if any
    pub fn report(&self) -> Option<&ExportReport> {
        match self {
            StopOutcome::Exported(report) => Some(report),
            _ => None,
        }
    }
}
