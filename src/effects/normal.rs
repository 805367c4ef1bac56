//! Surface-normal-style view
//!
//! Sobel gradients of the luminance are min-max normalized per axis and packed
//! into a (gx, gy, 1.0) triple, which is then collapsed back to a single
//! intensity (gx as blue, gy as green, the constant as red) and colored with
//! the parula ramp.

use super::colormap;
use image::{GrayImage, Luma, RgbImage};

/// Index into `0..len` with reflect-101 border handling (`-1 -> 1`, `len -> len-2`).
fn reflect101(i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * len - 2 - i;
    }
    i as u32
}

/// Horizontal and vertical 3x3 Sobel responses, row-major
fn sobel(gray: &GrayImage) -> (Vec<f32>, Vec<f32>) {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as i64, height as i64);
    let at = |x: i64, y: i64| gray.get_pixel(reflect101(x, w), reflect101(y, h)).0[0] as f32;

    let mut gx = Vec::with_capacity((width * height) as usize);
    let mut gy = Vec::with_capacity((width * height) as usize);

    for y in 0..h {
        for x in 0..w {
            let (tl, t, tr) = (at(x - 1, y - 1), at(x, y - 1), at(x + 1, y - 1));
            let (l, r) = (at(x - 1, y), at(x + 1, y));
            let (bl, b, br) = (at(x - 1, y + 1), at(x, y + 1), at(x + 1, y + 1));

            gx.push((tr + 2.0 * r + br) - (tl + 2.0 * l + bl));
            gy.push((bl + 2.0 * b + br) - (tl + 2.0 * t + tr));
        }
    }

    (gx, gy)
}

/// Rescale in place to [0, 1]; a constant field becomes all zeros.
fn normalize_min_max(values: &mut [f32]) {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    for v in values.iter_mut() {
        *v = if range > f32::EPSILON { (*v - min) / range } else { 0.0 };
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Stylized surface-normal view of a frame
pub fn normal_style(frame: &RgbImage) -> RgbImage {
    let gray = colormap::to_luminance(frame);
    let (width, height) = gray.dimensions();

    let (mut gx, mut gy) = sobel(&gray);
    normalize_min_max(&mut gx);
    normalize_min_max(&mut gy);

    let constant = unit_to_u8(1.0);
    let packed = GrayImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        Luma([colormap::luma(constant, unit_to_u8(gy[i]), unit_to_u8(gx[i]))])
    });

    colormap::apply(&packed, colormap::parula())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
    }

    #[test]
    fn test_flat_frame_has_zero_gradient() {
        let frame = RgbImage::from_pixel(8, 8, Rgb([40, 200, 10]));
        let normal = normal_style(&frame);
        // gx = gy = 0 after normalization, only the constant red term remains
        let expected = colormap::parula()[colormap::luma(255, 0, 0) as usize];
        assert!(normal.pixels().all(|p| p.0 == expected));
    }

    #[test]
    fn test_vertical_edge_lights_up_gx() {
        let frame = RgbImage::from_fn(8, 4, |x, _| if x < 4 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let gray = colormap::to_luminance(&frame);
        let (gx, gy) = sobel(&gray);
        assert!(gx[3] > 0.0);
        assert!(gx[4] > 0.0);
        assert_eq!(gx[0], 0.0);
        assert!(gy.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_deterministic() {
        let frame = RgbImage::from_fn(13, 11, |x, y| Rgb([(x * y) as u8, (x * 19) as u8, (y * 23) as u8]));
        let a = normal_style(&frame);
        let b = normal_style(&frame);
        assert_eq!(a.dimensions(), (13, 11));
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
