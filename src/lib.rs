//! Modality Recorder - record what the host renders, with derived views.
//!
//! Frames are sampled at a fixed cadence from a [`capture::FrameSource`] while
//! the host drives [`recorder::RecordingController::tick`]. When recording
//! stops, every frame is exported as one video whose frames tile the capture
//! with its depth-style, normal-style and histogram views.

pub mod capture;
pub mod compositor;
pub mod config;
pub mod effects;
pub mod export;
pub mod recorder;
pub mod utils;

pub use capture::{Frame, FrameSource, Resolution};
pub use config::RecordingSettings;
pub use export::{ExportReport, VideoExporter};
pub use recorder::{RecordingController, RecordingEvent, RecordingState, StopOutcome};
pub use utils::{RecorderError, RecorderResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default log subscriber. `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modality_recorder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
