//! Video export module
//!
//! Buffered frames are expanded into 2x2 composites and encoded into a
//! single video file when a recording stops.

pub mod ffmpeg;
pub mod pipeline;
pub mod sink;
pub mod types;

pub use ffmpeg::{ffmpeg_available, probe_video, FfmpegSinkFactory, VideoInfo};
pub use pipeline::{output_file_name, VideoExporter};
pub use sink::{MemorySinkFactory, MemoryVideo, VideoSink, VideoSinkFactory};
pub use types::{
    EncoderSettings, ExportError, ExportFormat, ExportProgress, ExportQuality, ExportReport,
    ExportStage,
};
