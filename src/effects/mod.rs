//! Derived views
//!
//! Pure transforms from one RGB frame to a stylized view of the same size.
//! None of them carry state, so they can run in any order.

pub mod colormap;
pub mod depth;
pub mod draw;
pub mod histogram;
pub mod normal;

pub use depth::depth_style;
pub use histogram::histogram_style;
pub use normal::normal_style;

use crate::config::Modalities;
use image::RgbImage;

/// The derived views of one frame; `None` for a disabled modality
#[derive(Debug, Clone, Default)]
pub struct DerivedViews {
    pub depth: Option<RgbImage>,
    pub normal: Option<RgbImage>,
    pub histogram: Option<RgbImage>,
}

impl DerivedViews {
    /// Compute only the enabled views of `frame`
    pub fn render(frame: &RgbImage, modalities: Modalities) -> Self {
        Self {
            depth: modalities.depth.then(|| depth_style(frame)),
            normal: modalities.surface_normal.then(|| normal_style(frame)),
            histogram: modalities.histogram.then(|| histogram_style(frame)),
        }
    }
}
