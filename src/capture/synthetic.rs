//! Synthetic frame sources
//!
//! Stand-ins for a host viewport, used by the demo binary and tests.

use super::traits::{CaptureError, Frame, FrameSource, Resolution};
use image::Rgb;

/// Always returns the same solid color
#[derive(Debug, Clone)]
pub struct SolidColorSource {
    resolution: Resolution,
    color: [u8; 3],
    captures: u64,
}

impl SolidColorSource {
    pub fn new(resolution: Resolution, color: [u8; 3]) -> Self {
        Self {
            resolution,
            color,
            captures: 0,
        }
    }

    /// Number of frames handed out so far
    pub fn captures(&self) -> u64 {
        self.captures
    }
}

impl FrameSource for SolidColorSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(CaptureError::Empty);
        }
        self.captures += 1;
        Ok(Frame::from_pixel(
            self.resolution.width,
            self.resolution.height,
            Rgb(self.color),
        ))
    }
}

/// A diagonal gradient that scrolls a few pixels per capture, so exported
/// videos show motion in every quadrant.
#[derive(Debug, Clone)]
pub struct ScrollingGradientSource {
    resolution: Resolution,
    offset: u32,
    step: u32,
}

impl ScrollingGradientSource {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            offset: 0,
            step: 4,
        }
    }
}

impl FrameSource for ScrollingGradientSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let Resolution { width, height } = self.resolution;
        if width == 0 || height == 0 {
            return Err(CaptureError::Empty);
        }

        let offset = self.offset;
        self.offset = (self.offset + self.step) % width;

        Ok(Frame::from_fn(width, height, |x, y| {
            let r = ((x + offset) * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y + offset) % 256) as u8;
            Rgb([r, g, b])
        }))
    }
}
