// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flattening: composite transparency over white and reduce to 8-bit RGB or
// bilevel grayscale, the pixel layouts the writers accept.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// Luma value at or above which a pixel becomes white when thresholding.
pub const BILEVEL_THRESHOLD: u8 = 128;

/// Approximate decoded size of an image: width × height × (4 with alpha, 3
/// without).
pub fn estimated_bytes(image: &DynamicImage) -> usize {
    let channels = if image.color().has_alpha() { 4 } else { 3 };
    image.width() as usize * image.height() as usize * channels
}

/// Convert any image to 8-bit RGB, compositing alpha over a white
/// background.
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        out.put_pixel(x, y, Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]));
    }
    out
}

/// Flatten, then threshold luma to pure black and white.
pub fn threshold_to_bilevel(image: &DynamicImage) -> GrayImage {
    let gray = DynamicImage::ImageRgb8(flatten_to_rgb(image)).to_luma8();
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel.0[0] >= BILEVEL_THRESHOLD { 255 } else { 0 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let alpha = alpha as u32;
    ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([10, 20, 30, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let rgb = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn half_transparent_black_is_mid_gray() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let rgb = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        let [r, g, b] = rgb.get_pixel(0, 0).0;
        assert!((126..=128).contains(&r), "{r}");
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn byte_estimate_counts_alpha_channel() {
        let rgb = DynamicImage::new_rgb8(10, 20);
        let rgba = DynamicImage::new_rgba8(10, 20);
        assert_eq!(estimated_bytes(&rgb), 600);
        assert_eq!(estimated_bytes(&rgba), 800);
    }

    #[test]
    fn bilevel_output_has_two_values() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([10]));
        gray.put_pixel(1, 0, Luma([127]));
        gray.put_pixel(2, 0, Luma([200]));
        let out = threshold_to_bilevel(&DynamicImage::ImageLuma8(gray));
        let values: Vec<u8> = out.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255]);
    }
}
