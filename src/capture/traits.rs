//! Capture trait definitions
//!
//! The host application owns rendering; the recorder only asks it for the
//! pixels currently on screen.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One captured RGB sample, row-major, 3 bytes per pixel, no alpha.
pub type Frame = RgbImage;

/// Frame resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolution of an existing frame
    pub fn of(frame: &Frame) -> Self {
        let (width, height) = frame.dimensions();
        Self { width, height }
    }

    /// Resolution of the 2x2 composite built from frames of this size
    pub fn doubled(&self) -> Self {
        Self {
            width: self.width * 2,
            height: self.height * 2,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Reasons a frame could not be read back
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No renderable surface: {0}")]
    Unavailable(String),

    #[error("Pixel buffer has {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Zero-sized surface")]
    Empty,
}

/// Source of the host's current rendered pixels
pub trait FrameSource: Send {
    /// Read back the pixels currently presented by the host
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Result<Frame, CaptureError> + Send,
{
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        self()
    }
}

/// Build a frame from a 4-byte-per-pixel readback, picking the RGB channel
/// offsets out of each pixel.
fn frame_from_packed(
    width: u32,
    height: u32,
    data: &[u8],
    [r, g, b]: [usize; 3],
) -> Result<Frame, CaptureError> {
    if width == 0 || height == 0 {
        return Err(CaptureError::Empty);
    }

    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(CaptureError::BufferSize {
            width,
            height,
            expected,
            actual: data.len(),
        });
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in data.chunks_exact(4) {
        rgb.extend_from_slice(&[px[r], px[g], px[b]]);
    }

    RgbImage::from_raw(width, height, rgb).ok_or(CaptureError::Empty)
}

/// Convert a BGRA viewport readback (alpha dropped) into a frame
pub fn frame_from_bgra(width: u32, height: u32, data: &[u8]) -> Result<Frame, CaptureError> {
    frame_from_packed(width, height, data, [2, 1, 0])
}

/// Convert an RGBA readback (alpha dropped) into a frame
pub fn frame_from_rgba(width: u32, height: u32, data: &[u8]) -> Result<Frame, CaptureError> {
    frame_from_packed(width, height, data, [0, 1, 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_swaps_channels() {
        // Two pixels: pure blue, pure red (BGRA)
        let data = [255, 0, 0, 255, 0, 0, 255, 128];
        let frame = frame_from_bgra(2, 1, &data).unwrap();
        assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(frame.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_rgba_keeps_channels() {
        let data = [10, 20, 30, 0];
        let frame = frame_from_rgba(1, 1, &data).unwrap();
        assert_eq!(frame.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let err = frame_from_bgra(2, 2, &[0; 12]).unwrap_err();
        assert!(matches!(err, CaptureError::BufferSize { expected: 16, actual: 12, .. }));
        assert!(matches!(frame_from_rgba(0, 4, &[]), Err(CaptureError::Empty)));
    }

    #[test]
    fn test_closure_is_a_source() {
        let mut calls = 0;
        let mut source = move || {
            calls += 1;
            if calls > 1 {
                Err(CaptureError::Unavailable("viewport closed".into()))
            } else {
                Ok(Frame::new(4, 4))
            }
        };
        assert!(source.capture().is_ok());
        assert!(source.capture().is_err());
    }

    #[test]
    fn test_resolution_doubled() {
        let res = Resolution::of(&Frame::new(64, 48));
        assert_eq!(res.doubled(), Resolution::new(128, 96));
        assert_eq!(res.to_string(), "64x48");
    }
}
