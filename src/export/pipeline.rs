//! Export pipeline orchestration
//!
//! Turns a buffer of captured frames into one video: derived views and
//! compositing per frame, then the encoder.

use crate::capture::{Frame, Resolution};
use crate::compositor;
use crate::config::{Modalities, RecordingSettings};
use crate::effects::DerivedViews;
use crate::export::ffmpeg::FfmpegSinkFactory;
use crate::export::sink::{VideoSink, VideoSinkFactory};
use crate::export::types::{EncoderSettings, ExportError, ExportProgress, ExportReport};
use chrono::{DateTime, Local};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// File name prefix of every exported video
pub const FILE_PREFIX: &str = "Lyra_vid_";

/// `Lyra_vid_YYYYMMDD_HHMMSS.<ext>`
pub fn output_file_name(timestamp: &DateTime<Local>, extension: &str) -> String {
    format!("{}{}.{}", FILE_PREFIX, timestamp.format("%Y%m%d_%H%M%S"), extension)
}

/// Pick a path in `dir` that does not exist yet. Two exports in the same
/// second get `_1`, `_2`, ... suffixes.
fn unique_output_path(dir: &Path, timestamp: &DateTime<Local>, extension: &str) -> PathBuf {
    let candidate = dir.join(output_file_name(timestamp, extension));
    if !candidate.exists() {
        return candidate;
    }

    let stem = format!("{}{}", FILE_PREFIX, timestamp.format("%Y%m%d_%H%M%S"));
    (1u32..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, extension)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Check every frame against the first one
fn validate_frames(frames: &[Frame]) -> Result<Resolution, ExportError> {
    let expected = Resolution::of(&frames[0]);
    if expected.width == 0 || expected.height == 0 {
        return Err(ExportError::Encoding("zero-sized frames".to_string()));
    }

    for (index, frame) in frames.iter().enumerate().skip(1) {
        let actual = Resolution::of(frame);
        if actual != expected {
            return Err(ExportError::FrameSizeMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(expected)
}

/// Render, composite and encode every frame, then close the sink
fn write_composites<F>(
    mut sink: Box<dyn VideoSink>,
    frames: &[Frame],
    modalities: Modalities,
    placeholder: &RgbImage,
    progress_callback: &F,
) -> Result<u64, ExportError>
where
    F: Fn(ExportProgress),
{
    let total_frames = frames.len() as u64;

    for (index, frame) in frames.iter().enumerate() {
        let views = DerivedViews::render(frame, modalities);
        let composite = compositor::compose(frame, &views, placeholder)?;
        sink.write_frame(&composite)?;

        let done = index as u64 + 1;
        if done % 10 == 0 || done == total_frames {
            progress_callback(ExportProgress::encoding(done, total_frames));
        }
    }

    progress_callback(ExportProgress::finalizing(total_frames));
    sink.finish()
}

/// Writes buffered recordings to disk
#[derive(Clone)]
pub struct VideoExporter {
    project_dir: PathBuf,
    sink_factory: Arc<dyn VideoSinkFactory>,
}

impl std::fmt::Debug for VideoExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoExporter")
            .field("project_dir", &self.project_dir)
            .finish_non_exhaustive()
    }
}

impl VideoExporter {
    /// Export with FFmpeg, resolving output directories against `project_dir`
    pub fn new(project_dir: PathBuf) -> Self {
        Self::with_sink_factory(project_dir, Arc::new(FfmpegSinkFactory::new()))
    }

    /// Export through a custom encoder
    pub fn with_sink_factory(project_dir: PathBuf, sink_factory: Arc<dyn VideoSinkFactory>) -> Self {
        Self {
            project_dir,
            sink_factory,
        }
    }

    /// Absolute directory videos are written to
    pub fn output_dir(&self, settings: &RecordingSettings) -> PathBuf {
        let base = if self.project_dir.is_absolute() {
            self.project_dir.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.project_dir))
                .unwrap_or_else(|_| self.project_dir.clone())
        };
        base.join(&settings.videos_dir)
    }

    /// Encode `frames` as one composite video.
    ///
    /// Returns `Ok(None)` without touching the disk when there are no frames.
    /// Blocks for the whole encode.
    pub fn export<F>(
        &self,
        session_id: Uuid,
        frames: &[Frame],
        settings: &RecordingSettings,
        progress_callback: F,
    ) -> Result<Option<ExportReport>, ExportError>
    where
        F: Fn(ExportProgress),
    {
        if frames.is_empty() {
            tracing::info!("Nothing to export for session {}", session_id);
            return Ok(None);
        }

        let total_frames = frames.len() as u64;
        progress_callback(ExportProgress::preparing(total_frames));

        let result = self.encode(session_id, frames, settings, &progress_callback);
        match &result {
            Ok(report) => {
                progress_callback(ExportProgress::complete(total_frames));
                tracing::info!(
                    "Exported {} frames ({}) to {:?}",
                    report.frame_count,
                    report.resolution,
                    report.output_path
                );
            }
            Err(e) => {
                progress_callback(ExportProgress::error(e.to_string()));
                tracing::error!("Export of session {} failed: {}", session_id, e);
            }
        }

        result.map(Some)
    }

    fn encode<F>(
        &self,
        session_id: Uuid,
        frames: &[Frame],
        settings: &RecordingSettings,
        progress_callback: &F,
    ) -> Result<ExportReport, ExportError>
    where
        F: Fn(ExportProgress),
    {
        // 1. Output directory
        let output_dir = self.output_dir(settings);
        tracing::info!("Export directory: {:?}", output_dir);
        fs::create_dir_all(&output_dir).map_err(|source| ExportError::DirectoryCreate {
            path: output_dir.clone(),
            source,
        })?;

        // 2. Every frame must match the first
        let tile = validate_frames(frames)?;

        // 3. Encoder
        let output_path = unique_output_path(&output_dir, &Local::now(), settings.format.extension());
        let encoder_settings = EncoderSettings {
            output_path: output_path.clone(),
            resolution: tile.doubled(),
            fps: settings.capture_fps(),
            format: settings.format,
            quality: settings.quality,
        };
        let sink = self.sink_factory.open(&encoder_settings)?;

        // 4. Render and write
        let modalities = settings.modalities();
        let placeholder = compositor::placeholder(tile);

        let written = write_composites(sink, frames, modalities, &placeholder, progress_callback);

        let frame_count = match written {
            Ok(count) => count,
            Err(e) => {
                // Don't leave a truncated file behind
                if output_path.exists() {
                    if let Err(rm) = fs::remove_file(&output_path) {
                        tracing::warn!("Failed to remove partial output {:?}: {}", output_path, rm);
                    }
                }
                return Err(e);
            }
        };

        Ok(ExportReport {
            session_id,
            output_path,
            frame_count,
            resolution: encoder_settings.resolution,
            fps: encoder_settings.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Quadrant;
    use crate::export::sink::MemorySinkFactory;
    use chrono::TimeZone;
    use image::Rgb;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    fn exporter(dir: &Path) -> (VideoExporter, MemorySinkFactory) {
        let factory = MemorySinkFactory::new();
        let exporter = VideoExporter::with_sink_factory(dir.to_path_buf(), Arc::new(factory.clone()));
        (exporter, factory)
    }

    fn solid(w: u32, h: u32, c: [u8; 3]) -> Frame {
        Frame::from_pixel(w, h, Rgb(c))
    }

    #[test]
    fn test_output_file_name() {
        let ts = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(output_file_name(&ts, "mp4"), "Lyra_vid_20240307_090502.mp4");
    }

    #[test]
    fn test_unique_output_path_adds_suffix() {
        let dir = tempdir().unwrap();
        let ts = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let first = unique_output_path(dir.path(), &ts, "mp4");
        fs::write(&first, b"").unwrap();
        let second = unique_output_path(dir.path(), &ts, "mp4");
        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("Lyra_vid_20240101_000000_1.mp4"));
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let dir = tempdir().unwrap();
        let (exporter, factory) = exporter(dir.path());
        let settings = RecordingSettings::default();

        let report = exporter.export(Uuid::new_v4(), &[], &settings, |_| {}).unwrap();
        assert!(report.is_none());
        assert!(!exporter.output_dir(&settings).exists());
        assert!(factory.videos().is_empty());
    }

    #[test]
    fn test_n_frames_doubled() {
        let dir = tempdir().unwrap();
        let (exporter, factory) = exporter(dir.path());
        let settings = RecordingSettings::default();
        let frames = vec![solid(32, 24, [90, 120, 200]); 5];

        let report = exporter
            .export(Uuid::new_v4(), &frames, &settings, |_| {})
            .unwrap()
            .unwrap();

        assert_eq!(report.frame_count, 5);
        assert_eq!(report.resolution, Resolution::new(64, 48));
        assert_eq!(report.fps, 30);
        assert!(report.output_path.exists());
        assert!(report.output_path.starts_with(dir.path().join("Saved/LyraRecordings")));
        assert!(report
            .output_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Lyra_vid_"));

        let videos = factory.videos();
        assert_eq!(videos.len(), 1);
        assert!(videos[0].finished);
        assert_eq!(videos[0].frames.len(), 5);
        assert!(videos[0].frames.iter().all(|f| f.dimensions() == (64, 48)));
    }

    #[test]
    fn test_depth_and_histogram_without_normal() {
        let dir = tempdir().unwrap();
        let (exporter, factory) = exporter(dir.path());
        let settings = RecordingSettings {
            include_depth: true,
            include_surface_normal: false,
            include_histogram: true,
            ..Default::default()
        };
        let frames = vec![
            solid(64, 64, [255, 0, 0]),
            solid(64, 64, [0, 255, 0]),
            solid(64, 64, [0, 0, 255]),
        ];

        let report = exporter
            .export(Uuid::new_v4(), &frames, &settings, |_| {})
            .unwrap()
            .unwrap();
        assert_eq!(report.frame_count, 3);

        let placeholder = compositor::placeholder(Resolution::new(64, 64));
        let video = &factory.videos()[0];
        assert_eq!(video.settings.resolution, Resolution::new(128, 128));

        for (composite, frame) in video.frames.iter().zip(&frames) {
            assert_eq!(composite.dimensions(), (128, 128));
            assert_eq!(Quadrant::TopLeft.crop(composite).as_raw(), frame.as_raw());
            assert_eq!(
                Quadrant::TopRight.crop(composite).as_raw(),
                crate::effects::depth_style(frame).as_raw()
            );
            assert_eq!(Quadrant::BottomLeft.crop(composite).as_raw(), placeholder.as_raw());
            assert_eq!(
                Quadrant::BottomRight.crop(composite).as_raw(),
                crate::effects::histogram_style(frame).as_raw()
            );
        }
    }

    #[test]
    fn test_mismatched_frames_rejected_before_encoding() {
        let dir = tempdir().unwrap();
        let (exporter, factory) = exporter(dir.path());
        let frames = vec![solid(16, 16, [0, 0, 0]), solid(20, 16, [0, 0, 0])];

        let err = exporter
            .export(Uuid::new_v4(), &frames, &RecordingSettings::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, ExportError::FrameSizeMismatch { index: 1, .. }));
        assert!(factory.videos().is_empty());
    }

    #[test]
    fn test_directory_create_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A regular file where the project directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let (exporter, _) = exporter(&blocker);

        let err = exporter
            .export(Uuid::new_v4(), &[solid(8, 8, [1, 1, 1])], &RecordingSettings::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, ExportError::DirectoryCreate { .. }));
    }

    struct FailingFactory;

    impl VideoSinkFactory for FailingFactory {
        fn open(&self, _: &EncoderSettings) -> Result<Box<dyn VideoSink>, ExportError> {
            Err(ExportError::EncoderOpen("codec unavailable".to_string()))
        }
    }

    #[test]
    fn test_encoder_open_failure_is_reported() {
        let dir = tempdir().unwrap();
        let exporter = VideoExporter::with_sink_factory(dir.path().to_path_buf(), Arc::new(FailingFactory));
        let stages = Mutex::new(Vec::new());

        let err = exporter
            .export(Uuid::new_v4(), &[solid(8, 8, [1, 1, 1])], &RecordingSettings::default(), |p| {
                stages.lock().push(p.stage)
            })
            .unwrap_err();

        assert!(matches!(err, ExportError::EncoderOpen(_)));
        let stages = stages.into_inner();
        assert!(matches!(stages.last(), Some(crate::export::ExportStage::Error { .. })));
    }

    #[test]
    fn test_progress_reaches_complete() {
        let dir = tempdir().unwrap();
        let (exporter, _) = exporter(dir.path());
        let seen = Mutex::new(Vec::new());
        let frames = vec![solid(8, 8, [5, 5, 5]); 12];

        exporter
            .export(Uuid::new_v4(), &frames, &RecordingSettings::default(), |p| {
                seen.lock().push((p.current_frame, p.percent))
            })
            .unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.first().unwrap().1, 0.0);
        assert_eq!(seen.last().unwrap().1, 100.0);
        assert!(seen.iter().any(|&(frame, _)| frame == 10));
        assert!(seen.iter().any(|&(frame, _)| frame == 12));
    }
}
