//! Indexed-color conversion with optional dithering.
//!
//! Fourth stage of the pipeline, and the one that fixes the final color
//! count: every frame is mapped onto a single palette built from samples
//! across the whole sequence, which later becomes the GIF's global color
//! table. One palette for the whole animation keeps colors stable across
//! frames and lets a post-dither watermark re-snap exactly.
//!
//! Methods:
//!
//! - `none` — nearest palette entry, no patterning
//! - `ordered` — 4x4 Bayer threshold bias before the nearest lookup
//! - `floyd-steinberg` — error diffusion (7/16, 3/16, 5/16, 1/16)
//! - `raster` — two-level checkerboard bias, a coarse fixed pattern
//!
//! The same method applies to every frame; there is no per-frame
//! override.

use color_quant::NeuQuant;
use image::{Rgba, RgbaImage};

use crate::config::DitherMethod;

/// One frame reduced to palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major palette indices, `width * height` entries.
    pub data: Vec<u8>,
}

impl IndexedFrame {
    /// Promote back to truecolor (opaque alpha) for compositing.
    pub fn to_rgba(&self, palette: &[[u8; 3]]) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (pixel, &idx) in out.pixels_mut().zip(self.data.iter()) {
            let [r, g, b] = palette[idx as usize];
            *pixel = Rgba([r, g, b, 255]);
        }
        out
    }
}

/// Bias amplitude for the patterned methods, in channel units.
const PATTERN_SPREAD: f32 = 32.0;

/// 4x4 Bayer matrix, values 0-15.
const BAYER4: [[f32; 4]; 4] = [
    [0.0, 8.0, 2.0, 10.0],
    [12.0, 4.0, 14.0, 6.0],
    [3.0, 11.0, 1.0, 9.0],
    [15.0, 7.0, 13.0, 5.0],
];

/// NeuQuant sample quality, as in the transform stage.
const QUANT_SAMPLE_FAC: i32 = 10;

/// Cap on pixels sampled for palette building; longer sequences are
/// strided so palette cost stays flat.
const MAX_PALETTE_SAMPLES: usize = 1 << 16;

/// Build a palette of at most `colors` entries from samples across the
/// whole sequence.
pub fn build_palette(frames: &[RgbaImage], colors: u16) -> Vec<[u8; 3]> {
    let total: usize = frames
        .iter()
        .map(|f| (f.width() * f.height()) as usize)
        .sum();
    let stride = (total / MAX_PALETTE_SAMPLES).max(1);

    let mut samples = Vec::with_capacity(total.min(MAX_PALETTE_SAMPLES) * 4);
    for (i, pixel) in frames.iter().flat_map(|f| f.pixels()).enumerate() {
        if i % stride == 0 {
            let [r, g, b, _] = pixel.0;
            samples.extend_from_slice(&[r, g, b, 255]);
        }
    }

    if colors <= 1 {
        return vec![mean_color(&samples)];
    }

    let nq = NeuQuant::new(QUANT_SAMPLE_FAC, colors as usize, &samples);
    nq.color_map_rgb()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect()
}

fn mean_color(rgba_samples: &[u8]) -> [u8; 3] {
    let count = (rgba_samples.len() / 4).max(1) as u64;
    let mut sums = [0u64; 3];
    for px in rgba_samples.chunks_exact(4) {
        for (s, &c) in sums.iter_mut().zip(px.iter()) {
            *s += c as u64;
        }
    }
    [
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ]
}

/// Index of the palette entry closest to `rgb` (squared distance).
fn nearest_index(palette: &[[u8; 3]], rgb: [f32; 3]) -> u8 {
    let mut best = 0usize;
    let mut best_dist = f32::MAX;
    for (i, entry) in palette.iter().enumerate() {
        let dr = rgb[0] - entry[0] as f32;
        let dg = rgb[1] - entry[1] as f32;
        let db = rgb[2] - entry[2] as f32;
        let dist = dr * dr + dg * dg + db * db;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best as u8
}

/// Nearest-color mapping with no dither pattern. Also used to re-snap
/// watermarked frames onto an existing palette.
pub fn snap_to_palette(frame: &RgbaImage, palette: &[[u8; 3]]) -> IndexedFrame {
    let data = frame
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            nearest_index(palette, [r as f32, g as f32, b as f32])
        })
        .collect();
    IndexedFrame {
        width: frame.width(),
        height: frame.height(),
        data,
    }
}

/// A fixed per-position bias added to every channel before the nearest
/// lookup. Ordered uses the Bayer matrix; raster alternates a
/// checkerboard.
fn patterned(frame: &RgbaImage, palette: &[[u8; 3]], bias: impl Fn(u32, u32) -> f32) -> IndexedFrame {
    let mut data = Vec::with_capacity((frame.width() * frame.height()) as usize);
    for (x, y, pixel) in frame.enumerate_pixels() {
        let b = bias(x, y);
        let [r, g, bl, _] = pixel.0;
        data.push(nearest_index(
            palette,
            [r as f32 + b, g as f32 + b, bl as f32 + b],
        ));
    }
    IndexedFrame {
        width: frame.width(),
        height: frame.height(),
        data,
    }
}

/// Floyd–Steinberg error diffusion onto the palette.
fn floyd_steinberg(frame: &RgbaImage, palette: &[[u8; 3]]) -> IndexedFrame {
    let (w, h) = frame.dimensions();
    // Working copy in f32 so diffused error survives multiple pushes.
    let mut work: Vec<[f32; 3]> = frame
        .pixels()
        .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
        .collect();
    let mut data = Vec::with_capacity((w * h) as usize);

    let idx = |x: u32, y: u32| (y * w + x) as usize;
    for y in 0..h {
        for x in 0..w {
            let old = work[idx(x, y)];
            let i = nearest_index(palette, old);
            data.push(i);
            let chosen = palette[i as usize];
            let err = [
                old[0] - chosen[0] as f32,
                old[1] - chosen[1] as f32,
                old[2] - chosen[2] as f32,
            ];

            let mut diffuse = |x: u32, y: u32, factor: f32| {
                let target = &mut work[idx(x, y)];
                for (t, e) in target.iter_mut().zip(err.iter()) {
                    *t += e * factor;
                }
            };
            if x + 1 < w {
                diffuse(x + 1, y, 7.0 / 16.0);
            }
            if y + 1 < h {
                if x > 0 {
                    diffuse(x - 1, y + 1, 3.0 / 16.0);
                }
                diffuse(x, y + 1, 5.0 / 16.0);
                if x + 1 < w {
                    diffuse(x + 1, y + 1, 1.0 / 16.0);
                }
            }
        }
    }

    IndexedFrame {
        width: w,
        height: h,
        data,
    }
}

/// Convert one frame to indexed color with the selected method.
pub fn dither_frame(frame: &RgbaImage, palette: &[[u8; 3]], method: DitherMethod) -> IndexedFrame {
    match method {
        DitherMethod::None => snap_to_palette(frame, palette),
        DitherMethod::FloydSteinberg => floyd_steinberg(frame, palette),
        DitherMethod::Ordered => patterned(frame, palette, |x, y| {
            (BAYER4[(y % 4) as usize][(x % 4) as usize] / 16.0 - 0.5) * PATTERN_SPREAD
        }),
        DitherMethod::Raster => patterned(frame, palette, |x, y| {
            if (x + y) % 2 == 0 {
                PATTERN_SPREAD / 2.0
            } else {
                -PATTERN_SPREAD / 2.0
            }
        }),
    }
}

/// Convert the whole sequence: one global palette, then each frame
/// indexed with the same method.
pub fn dither_sequence(
    frames: &[RgbaImage],
    colors: u16,
    method: DitherMethod,
) -> (Vec<[u8; 3]>, Vec<IndexedFrame>) {
    let palette = build_palette(frames, colors);
    let indexed = frames
        .iter()
        .map(|f| dither_frame(f, &palette, method))
        .collect();
    (palette, indexed)
}
