//! Recording settings
//!
//! Settings are resolved once, outside the recorder, and handed to it as a
//! plain value. The loader here reads a JSON file and falls back to defaults
//! when the file does not exist.

use crate::export::{ExportFormat, ExportQuality};
use crate::recorder::input::KeyId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default output directory, relative to the project directory
pub const DEFAULT_VIDEOS_DIR: &str = "Saved/LyraRecordings";

/// Fixed capture and output frame rate
pub const CAPTURE_FPS: u32 = 30;

/// Settings loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Resolved recording configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingSettings {
    /// Render the depth-style view (top-right)
    #[serde(alias = "Include_Depth")]
    pub include_depth: bool,

    /// Render the surface-normal-style view (bottom-left)
    #[serde(alias = "Include_SurfaceNormal")]
    pub include_surface_normal: bool,

    /// Render the histogram view (bottom-right)
    #[serde(alias = "Include_Histogram")]
    pub include_histogram: bool,

    /// Key that starts a recording
    #[serde(alias = "Start_Capture_Key")]
    pub start_capture_key: Option<KeyId>,

    /// Key that stops a recording
    #[serde(alias = "Stop_Capture_Key")]
    pub stop_capture_key: Option<KeyId>,

    /// Output directory, relative to the project directory unless absolute
    #[serde(alias = "Videos_dir")]
    pub videos_dir: String,

    /// Output container
    pub format: ExportFormat,

    /// Encoder quality
    pub quality: ExportQuality,

    /// Upper bound on catch-up captures in a single host tick (None = unbounded)
    pub max_captures_per_tick: Option<u32>,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            include_depth: true,
            include_surface_normal: true,
            include_histogram: true,
            start_capture_key: None,
            stop_capture_key: None,
            videos_dir: DEFAULT_VIDEOS_DIR.to_string(),
            format: ExportFormat::Mp4,
            quality: ExportQuality::Medium,
            max_captures_per_tick: None,
        }
    }
}

impl RecordingSettings {
    /// Capture cadence; not configurable
    pub fn capture_fps(&self) -> u32 {
        CAPTURE_FPS
    }

    /// Which derived views should be computed
    pub fn modalities(&self) -> Modalities {
        Modalities {
            depth: self.include_depth,
            surface_normal: self.include_surface_normal,
            histogram: self.include_histogram,
        }
    }

    /// Read settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;

        tracing::info!(
            "Loaded recording settings from {:?}: start key {:?}, stop key {:?}",
            path,
            settings.start_capture_key,
            settings.stop_capture_key
        );

        Ok(settings)
    }

    /// Read settings, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::error!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.videos_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("videos_dir is empty".to_string()));
        }
        if self.max_captures_per_tick == Some(0) {
            return Err(ConfigError::Invalid(
                "max_captures_per_tick must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Enabled derived views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modalities {
    pub depth: bool,
    pub surface_normal: bool,
    pub histogram: bool,
}
