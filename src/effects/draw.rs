//! Minimal raster primitives

use image::{Rgb, RgbImage};

/// Fill a `size`x`size` square whose top-left corner is (x, y), clipped to the image.
fn stamp(image: &mut RgbImage, x: i64, y: i64, size: i64, color: Rgb<u8>) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    for dy in 0..size {
        for dx in 0..size {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && px < width && py < height {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Bresenham line from `from` to `to`, `thickness` pixels wide
pub fn line(
    image: &mut RgbImage,
    from: (i64, i64),
    to: (i64, i64),
    thickness: u32,
    color: Rgb<u8>,
) {
    let size = thickness.max(1) as i64;
    let half = (size - 1) / 2;

    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(image, x - half, y - half, size, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Connect consecutive points with lines
pub fn polyline(image: &mut RgbImage, points: &[(i64, i64)], thickness: u32, color: Rgb<u8>) {
    for pair in points.windows(2) {
        line(image, pair[0], pair[1], thickness, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn test_horizontal_line() {
        let mut image = RgbImage::new(10, 5);
        line(&mut image, (1, 2), (8, 2), 1, WHITE);
        for x in 1..=8 {
            assert_eq!(*image.get_pixel(x, 2), WHITE);
        }
        assert_eq!(image.get_pixel(0, 2).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(4, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_thick_line_covers_neighbor_row() {
        let mut image = RgbImage::new(10, 5);
        line(&mut image, (0, 2), (9, 2), 2, WHITE);
        assert_eq!(*image.get_pixel(5, 3), WHITE);
    }

    #[test]
    fn test_clipping() {
        let mut image = RgbImage::new(4, 4);
        line(&mut image, (-5, -5), (10, 10), 2, WHITE);
        assert_eq!(*image.get_pixel(0, 0), WHITE);
        assert_eq!(*image.get_pixel(3, 3), WHITE);
    }

    #[test]
    fn test_polyline_joins_points() {
        let mut image = RgbImage::new(6, 6);
        polyline(&mut image, &[(0, 0), (5, 0), (5, 5)], 1, WHITE);
        assert_eq!(*image.get_pixel(5, 0), WHITE);
        assert_eq!(*image.get_pixel(5, 5), WHITE);
        assert_eq!(image.get_pixel(0, 5).0, [0, 0, 0]);
    }
}
