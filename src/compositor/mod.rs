//! 2x2 composite layout
//!
//! ```text
//! +-----------+-----------+
//! |    rgb    |   depth   |
//! +-----------+-----------+
//! |  normal   | histogram |
//! +-----------+-----------+
//! ```
//!
//! Disabled views are replaced by a black "Not Configured" tile.

pub mod glyphs;

use crate::capture::Resolution;
use crate::effects::DerivedViews;
use crate::export::ExportError;
use image::{imageops, Rgb, RgbImage};

pub const PLACEHOLDER_TEXT: &str = "Not Configured";

/// Quadrant positions in the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// Pixel offset of this quadrant for tiles of `tile` size
    pub fn origin(&self, tile: Resolution) -> (u32, u32) {
        match self {
            Quadrant::TopLeft => (0, 0),
            Quadrant::TopRight => (tile.width, 0),
            Quadrant::BottomLeft => (0, tile.height),
            Quadrant::BottomRight => (tile.width, tile.height),
        }
    }

    /// Copy this quadrant out of a composite
    pub fn crop(&self, composite: &RgbImage) -> RgbImage {
        let tile = Resolution::new(composite.width() / 2, composite.height() / 2);
        let (x, y) = self.origin(tile);
        imageops::crop_imm(composite, x, y, tile.width, tile.height).to_image()
    }
}

/// Black tile with centered white "Not Configured" text
pub fn placeholder(resolution: Resolution) -> RgbImage {
    let mut tile = RgbImage::new(resolution.width, resolution.height);

    // Aim for roughly three quarters of the tile width
    let unit_width = glyphs::text_width(PLACEHOLDER_TEXT, 1);
    let scale = (resolution.width * 3 / 4 / unit_width).max(1);

    let text_w = glyphs::text_width(PLACEHOLDER_TEXT, scale) as i64;
    let text_h = (glyphs::GLYPH_HEIGHT * scale) as i64;
    let x = (resolution.width as i64 - text_w) / 2;
    let y = (resolution.height as i64 - text_h) / 2;

    glyphs::draw_text(&mut tile, PLACEHOLDER_TEXT, x, y, scale, Rgb([255, 255, 255]));
    tile
}

fn check_size(image: &RgbImage, expected: Resolution, index: usize) -> Result<(), ExportError> {
    let actual = Resolution::of(image);
    if actual != expected {
        return Err(ExportError::FrameSizeMismatch {
            index,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Tile `rgb` and its derived views into one image twice as wide and tall.
///
/// `placeholder` must match the frame size; it is passed in so one tile can
/// be reused across a whole export.
pub fn compose(
    rgb: &RgbImage,
    views: &DerivedViews,
    placeholder: &RgbImage,
) -> Result<RgbImage, ExportError> {
    let tile = Resolution::of(rgb);
    check_size(placeholder, tile, 0)?;

    let out = tile.doubled();
    let mut composite = RgbImage::new(out.width, out.height);

    let layout = [
        (Quadrant::TopLeft, Some(rgb)),
        (Quadrant::TopRight, views.depth.as_ref()),
        (Quadrant::BottomLeft, views.normal.as_ref()),
        (Quadrant::BottomRight, views.histogram.as_ref()),
    ];

    for (quadrant, view) in layout {
        let image = view.unwrap_or(placeholder);
        check_size(image, tile, 0)?;
        let (x, y) = quadrant.origin(tile);
        imageops::replace(&mut composite, image, x as i64, y as i64);
    }

    Ok(composite)
}
