//! Color ramps and luminance
//!
//! Both ramps are 256-entry lookup tables built once on first use.

use image::{GrayImage, Luma, Rgb, RgbImage};
use std::sync::OnceLock;

/// 256-entry RGB lookup table
pub type Lut = [[u8; 3]; 256];

/// Anchor colors of the parula ramp, evenly spaced from 0 to 255
const PARULA_ANCHORS: [[u8; 3]; 9] = [
    [53, 42, 135],
    [15, 92, 221],
    [18, 125, 216],
    [7, 156, 207],
    [21, 177, 180],
    [89, 189, 140],
    [165, 190, 107],
    [225, 185, 82],
    [249, 251, 14],
];

/// BT.601 luma in 14-bit fixed point, rounded
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

/// Single-channel luminance of an RGB image
pub fn to_luminance(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

/// Map each gray level through a lookup table
pub fn apply(gray: &GrayImage, lut: &Lut) -> RgbImage {
    let (width, height) = gray.dimensions();
    RgbImage::from_fn(width, height, |x, y| Rgb(lut[gray.get_pixel(x, y).0[0] as usize]))
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Blue → cyan → yellow → red
pub fn jet() -> &'static Lut {
    static JET: OnceLock<Lut> = OnceLock::new();
    JET.get_or_init(|| {
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let v = i as f32 / 255.0;
            let r = 1.5 - (4.0 * v - 3.0).abs();
            let g = 1.5 - (4.0 * v - 2.0).abs();
            let b = 1.5 - (4.0 * v - 1.0).abs();
            *entry = [unit_to_u8(r), unit_to_u8(g), unit_to_u8(b)];
        }
        lut
    })
}

/// Deep blue → teal → yellow
pub fn parula() -> &'static Lut {
    static PARULA: OnceLock<Lut> = OnceLock::new();
    PARULA.get_or_init(|| {
        let segments = (PARULA_ANCHORS.len() - 1) as f32;
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let pos = i as f32 / 255.0 * segments;
            let lo = (pos.floor() as usize).min(PARULA_ANCHORS.len() - 2);
            let t = pos - lo as f32;
            let (a, b) = (PARULA_ANCHORS[lo], PARULA_ANCHORS[lo + 1]);
            for c in 0..3 {
                let mixed = a[c] as f32 + (b[c] as f32 - a[c] as f32) * t;
                entry[c] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
        lut
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_extremes() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_jet_endpoints() {
        let lut = jet();
        // Dark blue at the bottom, dark red at the top
        assert_eq!(lut[0], [0, 0, 128]);
        assert_eq!(lut[255], [128, 0, 0]);
        // Green peaks in the middle
        assert!(lut[128][1] > 250);
    }

    #[test]
    fn test_parula_endpoints() {
        let lut = parula();
        assert_eq!(lut[0], PARULA_ANCHORS[0]);
        assert_eq!(lut[255], PARULA_ANCHORS[8]);
    }

    #[test]
    fn test_apply_uses_lut() {
        let gray = GrayImage::from_pixel(2, 2, Luma([255]));
        let colored = apply(&gray, jet());
        assert!(colored.pixels().all(|p| p.0 == jet()[255]));
    }
}
