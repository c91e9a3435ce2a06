//! Pixel-block redaction
//!
//! A region is downsampled by block averaging and blown back up with
//! nearest-neighbor so every block becomes one flat color.

use image::{Rgba, RgbaImage, imageops};

/// Pixelate a whole image with blocks of `block_size` pixels
///
/// The image is reduced to `max(1, dim / block_size)` pixels per axis, each
/// the average of the source pixels it covers, then upsampled back to the
/// original size without interpolation.
pub fn pixelate(img: &RgbaImage, block_size: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let block_size = block_size.max(1);
    let small_w = (w / block_size).max(1);
    let small_h = (h / block_size).max(1);

    let small = downsample_average(img, small_w, small_h);
    imageops::resize(&small, w, h, imageops::FilterType::Nearest)
}

/// Area-average downsample to exactly `out_w` x `out_h`
fn downsample_average(img: &RgbaImage, out_w: u32, out_h: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let mut out = RgbaImage::new(out_w, out_h);

    for oy in 0..out_h {
        let y1 = (oy as u64 * h as u64 / out_h as u64) as u32;
        let y2 = (((oy as u64 + 1) * h as u64 / out_h as u64) as u32).max(y1 + 1);
        for ox in 0..out_w {
            let x1 = (ox as u64 * w as u64 / out_w as u64) as u32;
            let x2 = (((ox as u64 + 1) * w as u64 / out_w as u64) as u32).max(x1 + 1);
            if let Some(color) = average_color(img, x1, y1, x2, y2) {
                out.put_pixel(ox, oy, color);
            }
        }
    }
    out
}

/// Average color of the half-open pixel range `[x1, x2) x [y1, y2)`
pub fn average_color(img: &RgbaImage, x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Rgba<u8>> {
    let x2 = x2.min(img.width());
    let y2 = y2.min(img.height());
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let mut total_r: u64 = 0;
    let mut total_g: u64 = 0;
    let mut total_b: u64 = 0;
    let mut total_a: u64 = 0;
    let mut pixel_count: u64 = 0;

    for py in y1..y2 {
        for px in x1..x2 {
            let pixel = img.get_pixel(px, py);
            total_r += pixel[0] as u64;
            total_g += pixel[1] as u64;
            total_b += pixel[2] as u64;
            total_a += pixel[3] as u64;
            pixel_count += 1;
        }
    }

    if pixel_count == 0 {
        return None;
    }
    let avg = |total: u64| ((total + pixel_count / 2) / pixel_count) as u8;
    Some(Rgba([avg(total_r), avg(total_g), avg(total_b), avg(total_a)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 20) as u8, 128, 255]))
    }

    #[test]
    fn test_block_size_one_is_identity() {
        let img = gradient(12, 7);
        assert_eq!(pixelate(&img, 1), img);
    }

    #[test]
    fn test_full_block_flattens_to_average() {
        let img = gradient(8, 4);
        let out = pixelate(&img, 8);
        let expected = average_color(&img, 0, 0, 8, 4).unwrap();
        assert!(out.pixels().all(|p| *p == expected));
    }

    #[test]
    fn test_blocks_are_uniform() {
        let img = gradient(16, 16);
        let out = pixelate(&img, 4);
        for by in 0..4 {
            for bx in 0..4 {
                let first = *out.get_pixel(bx * 4, by * 4);
                for y in 0..4 {
                    for x in 0..4 {
                        assert_eq!(*out.get_pixel(bx * 4 + x, by * 4 + y), first);
                    }
                }
            }
        }
    }

    #[test]
    fn test_average_color_of_empty_range() {
        let img = gradient(4, 4);
        assert!(average_color(&img, 2, 2, 2, 4).is_none());
    }
}
