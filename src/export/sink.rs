//! Encoder seam
//!
//! The exporter talks to a [`VideoSink`] opened by a [`VideoSinkFactory`].
//! Production uses FFmpeg; [`MemorySinkFactory`] keeps frames in memory.

use crate::export::types::{EncoderSettings, ExportError};
use image::RgbImage;
use parking_lot::Mutex;
use std::fs::File;
use std::sync::Arc;

/// An open video output accepting composite frames in order
pub trait VideoSink: Send {
    /// Append one frame; must match the opened resolution
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), ExportError>;

    /// Flush and close the output, returning the number of frames written
    fn finish(self: Box<Self>) -> Result<u64, ExportError>;
}

/// Opens video outputs
pub trait VideoSinkFactory: Send + Sync {
    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn VideoSink>, ExportError>;
}

/// A video captured by [`MemorySinkFactory`]
#[derive(Debug, Clone)]
pub struct MemoryVideo {
    pub settings: EncoderSettings,
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

/// Keeps every written frame in memory. The output path is created as an
/// empty file on open so callers can observe where the video would land.
#[derive(Debug, Clone, Default)]
pub struct MemorySinkFactory {
    videos: Arc<Mutex<Vec<MemoryVideo>>>,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all videos opened so far
    pub fn videos(&self) -> Vec<MemoryVideo> {
        self.videos.lock().clone()
    }
}

impl VideoSinkFactory for MemorySinkFactory {
    fn open(&self, settings: &EncoderSettings) -> Result<Box<dyn VideoSink>, ExportError> {
        File::create(&settings.output_path).map_err(|e| {
            ExportError::EncoderOpen(format!("{:?}: {}", settings.output_path, e))
        })?;

        let mut videos = self.videos.lock();
        videos.push(MemoryVideo {
            settings: settings.clone(),
            frames: Vec::new(),
            finished: false,
        });

        Ok(Box::new(MemorySink {
            videos: self.videos.clone(),
            index: videos.len() - 1,
        }))
    }
}

struct MemorySink {
    videos: Arc<Mutex<Vec<MemoryVideo>>>,
    index: usize,
}

impl VideoSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), ExportError> {
        let mut videos = self.videos.lock();
        let video = &mut videos[self.index];
        if frame.dimensions() != (video.settings.resolution.width, video.settings.resolution.height) {
            return Err(ExportError::Encoding(format!(
                "frame is {}x{}, sink expects {}",
                frame.width(),
                frame.height(),
                video.settings.resolution
            )));
        }
        video.frames.push(frame.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<u64, ExportError> {
        let mut videos = self.videos.lock();
        let video = &mut videos[self.index];
        video.finished = true;
        Ok(video.frames.len() as u64)
    }
}
