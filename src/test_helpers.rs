//! Shared helpers for tests: synthetic image fixtures.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, Rgba, RgbaImage};
use std::collections::HashSet;
use std::path::Path;

/// An RGBA frame with per-pixel gradients on every channel.
pub fn gradient_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
            255,
        ])
    })
}

/// Number of distinct RGBA values in a frame.
pub fn distinct_colors(frame: &RgbaImage) -> usize {
    frame.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

/// Write a small valid PNG with gradient content.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient_frame(width, height).save(path).unwrap();
}

/// Write a small valid JPEG with gradient content.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::DynamicImage::ImageRgba8(gradient_frame(width, height)).to_rgb8();
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    JpegEncoder::new(writer)
        .write_image(
            img.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
}
