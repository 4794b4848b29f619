//! Per-frame geometric resampling and palette quantization.
//!
//! Second stage of the pipeline. Two independent operations, applied in
//! this order:
//!
//! 1. **Resample** by the configured factor using an area-averaging box
//!    filter (`round(dim * factor)` output dimensions, clamped to 1).
//!    Box averaging avoids aliasing when downscaling frame sequences.
//! 2. **Quantize** to at most N colors. The result stays truecolor — each
//!    pixel is snapped to its nearest palette entry but kept as RGBA — so
//!    the dissolve stage blends continuous channel values. Blending
//!    palette indices directly would produce garbage intermediate hues;
//!    the final indexed conversion happens later, in the dither stage.
//!
//! Both operations are pure and infallible. All frames are resampled by
//! the same factor, so sources of identical dimensions stay identical;
//! mismatched source sizes are a caller precondition violation and are
//! not silently normalized (the encoder rejects them).

use color_quant::NeuQuant;
use image::{Rgba, RgbaImage};

use crate::config::PipelineConfig;

/// NeuQuant sample quality: 1 = every pixel, 30 = fastest. 10 is the
/// conventional middle ground used by the gif ecosystem.
const QUANT_SAMPLE_FAC: i32 = 10;

/// Resample a frame by `factor` with an area-averaging box filter.
///
/// Output dimensions are `round(dim * factor)`, at least 1. A factor of
/// 1.0 is a byte-exact copy.
pub fn resample(frame: &RgbaImage, factor: f64) -> RgbaImage {
    let (sw, sh) = frame.dimensions();
    let ow = ((sw as f64 * factor).round() as u32).max(1);
    let oh = ((sh as f64 * factor).round() as u32).max(1);
    if (ow, oh) == (sw, sh) {
        return frame.clone();
    }

    let x_ratio = sw as f64 / ow as f64;
    let y_ratio = sh as f64 / oh as f64;

    RgbaImage::from_fn(ow, oh, |ox, oy| {
        // Source rectangle covered by this output pixel.
        let sx0 = ox as f64 * x_ratio;
        let sx1 = (ox + 1) as f64 * x_ratio;
        let sy0 = oy as f64 * y_ratio;
        let sy1 = (oy + 1) as f64 * y_ratio;

        let mut acc = [0.0f64; 4];
        let mut area = 0.0f64;

        let mut sy = sy0.floor() as u32;
        while (sy as f64) < sy1 && sy < sh {
            let hy = (sy1.min((sy + 1) as f64) - sy0.max(sy as f64)).max(0.0);
            let mut sx = sx0.floor() as u32;
            while (sx as f64) < sx1 && sx < sw {
                let wx = (sx1.min((sx + 1) as f64) - sx0.max(sx as f64)).max(0.0);
                let weight = wx * hy;
                let px = frame.get_pixel(sx, sy).0;
                for (a, &c) in acc.iter_mut().zip(px.iter()) {
                    *a += c as f64 * weight;
                }
                area += weight;
                sx += 1;
            }
            sy += 1;
        }

        let mut out = [0u8; 4];
        for (o, a) in out.iter_mut().zip(acc.iter()) {
            *o = (a / area).round().clamp(0.0, 255.0) as u8;
        }
        Rgba(out)
    })
}

/// Build a palette of at most `colors` entries from RGBA samples and
/// snap every pixel of `frame` to its nearest entry, staying truecolor.
///
/// NeuQuant needs at least two network entries, so a single-color target
/// collapses the frame to its mean color instead.
pub fn quantize(frame: &RgbaImage, colors: u16) -> RgbaImage {
    if colors <= 1 {
        return flatten_to_mean(frame);
    }

    let nq = NeuQuant::new(QUANT_SAMPLE_FAC, colors as usize, frame.as_raw());
    let map = nq.color_map_rgba();

    let mut out = frame.clone();
    for pixel in out.pixels_mut() {
        let idx = nq.index_of(&pixel.0);
        pixel.0.copy_from_slice(&map[idx * 4..idx * 4 + 4]);
    }
    out
}

/// Replace every pixel with the frame's mean color.
fn flatten_to_mean(frame: &RgbaImage) -> RgbaImage {
    let count = (frame.width() as u64 * frame.height() as u64).max(1);
    let mut sums = [0u64; 4];
    for pixel in frame.pixels() {
        for (s, &c) in sums.iter_mut().zip(pixel.0.iter()) {
            *s += c as u64;
        }
    }
    let mut mean = [0u8; 4];
    for (m, s) in mean.iter_mut().zip(sums.iter()) {
        *m = (s / count) as u8;
    }
    RgbaImage::from_pixel(frame.width(), frame.height(), Rgba(mean))
}

/// Apply resample and quantization to every frame per the config.
pub fn transform_sequence(frames: Vec<RgbaImage>, config: &PipelineConfig) -> Vec<RgbaImage> {
    frames
        .into_iter()
        .map(|frame| {
            let resampled = if config.resample_factor == 1.0 {
                frame
            } else {
                resample(&frame, config.resample_factor)
            };
            match config.palette_size {
                Some(colors) => quantize(&resampled, colors),
                None => resampled,
            }
        })
        .collect()
}
