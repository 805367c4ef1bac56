//! Depth-style view: luminance through the jet ramp

use super::colormap;
use image::RgbImage;

/// Stylized depth view of a frame. Brighter pixels read as "nearer" (red),
/// darker ones as "further" (blue).
pub fn depth_style(frame: &RgbImage) -> RgbImage {
    let gray = colormap::to_luminance(frame);
    colormap::apply(&gray, colormap::jet())
}
