//! Histogram view
//!
//! Per-channel 256-bin intensity histograms, drawn as three polylines on a
//! black canvas the size of the input frame.

use super::draw;
use image::{Rgb, RgbImage};

const BINS: usize = 256;
const LINE_THICKNESS: u32 = 2;

/// Channel index and plot color, in drawing order
const CHANNELS: [(usize, Rgb<u8>); 3] = [
    (2, Rgb([0, 0, 255])),
    (1, Rgb([0, 255, 0])),
    (0, Rgb([255, 0, 0])),
];

/// Count occurrences of each intensity for one channel
fn channel_histogram(frame: &RgbImage, channel: usize) -> [u32; BINS] {
    let mut bins = [0u32; BINS];
    for pixel in frame.pixels() {
        bins[pixel.0[channel] as usize] += 1;
    }
    bins
}

/// Min-max rescale counts into `[0, height]`
fn normalize(bins: &[u32; BINS], height: u32) -> [f32; BINS] {
    let min = *bins.iter().min().unwrap_or(&0) as f32;
    let max = *bins.iter().max().unwrap_or(&0) as f32;
    let range = max - min;

    let mut out = [0f32; BINS];
    if range > 0.0 {
        for (o, &b) in out.iter_mut().zip(bins.iter()) {
            *o = (b as f32 - min) / range * height as f32;
        }
    }
    out
}

/// Plot coordinates for one normalized histogram. Bins span the full width;
/// the tallest bin touches the top row and empty bins sit on the bottom row.
fn plot_points(levels: &[f32; BINS], width: u32, height: u32) -> Vec<(i64, i64)> {
    let last_x = width.saturating_sub(1) as f64;
    let last_y = height.saturating_sub(1) as i64;

    levels
        .iter()
        .enumerate()
        .map(|(i, &level)| {
            let x = (i as f64 * last_x / (BINS - 1) as f64).round() as i64;
            let y = (height as i64 - level.round() as i64).clamp(0, last_y);
            (x, y)
        })
        .collect()
}

/// Histogram view of a frame
pub fn histogram_style(frame: &RgbImage) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut canvas = RgbImage::new(width, height);

    for (channel, color) in CHANNELS {
        let levels = normalize(&channel_histogram(frame, channel), height);
        let points = plot_points(&levels, width, height);
        draw::polyline(&mut canvas, &points, LINE_THICKNESS, color);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_histogram_counts() {
        let frame = RgbImage::from_pixel(4, 2, Rgb([10, 20, 30]));
        let red = channel_histogram(&frame, 0);
        assert_eq!(red[10], 8);
        assert_eq!(red.iter().sum::<u32>(), 8);
        assert_eq!(channel_histogram(&frame, 2)[30], 8);
    }

    #[test]
    fn test_normalize_to_height() {
        let mut bins = [0u32; BINS];
        bins[100] = 50;
        bins[101] = 25;
        let levels = normalize(&bins, 64);
        assert_eq!(levels[100], 64.0);
        assert_eq!(levels[101], 32.0);
        assert_eq!(levels[0], 0.0);
    }

    #[test]
    fn test_solid_frame_draws_spikes() {
        let frame = RgbImage::from_pixel(64, 64, Rgb([200, 100, 50]));
        let hist = histogram_style(&frame);
        assert_eq!(hist.dimensions(), (64, 64));

        // Baseline is drawn in every channel's color somewhere on the bottom rows
        assert!(hist.pixels().any(|p| p.0 == [255, 0, 0]));
        assert!(hist.pixels().any(|p| p.0 == [0, 255, 0]));
        assert!(hist.pixels().any(|p| p.0 == [0, 0, 255]));

        // Red spike at intensity 200 reaches the top row
        let x = (200.0 * 63.0 / 255.0f64).round() as u32;
        assert_eq!(hist.get_pixel(x, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_deterministic() {
        let frame = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, (x + y) as u8]));
        assert_eq!(histogram_style(&frame).as_raw(), histogram_style(&frame).as_raw());
    }
}
