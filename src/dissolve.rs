//! Cross-dissolve interpolation.
//!
//! Third stage of the pipeline. Expands an n-frame sequence by inserting
//! `k` alpha-blended frames between every consecutive pair:
//!
//! ```text
//! k = 2 on [A, B, C] → [A, blend(A,B,0.5), B, blend(B,C,0.5), C]
//! ```
//!
//! For pair `(frame[i], frame[i+1])` and step `j` in `0..k`, the blend
//! weight is `alpha = j / k`, so the first emitted frame of each pair is
//! frame[i] itself (alpha = 0) and alpha approaches but never reaches 1
//! within the loop. The last original frame is appended once, unblended.
//! Output length is `(n-1)*k + 1`; memory grows accordingly, so very
//! large `k` on long sequences is the caller's responsibility to bound.
//!
//! `k = 0` is identity, and that case is checked before any division.

use image::RgbaImage;

/// Blend two equally sized frames: `a * (1 - alpha) + b * alpha`,
/// per channel.
pub fn blend(a: &RgbaImage, b: &RgbaImage, alpha: f64) -> RgbaImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        for (d, &s) in dst.0.iter_mut().zip(src.0.iter()) {
            *d = (*d as f64 * (1.0 - alpha) + s as f64 * alpha).round() as u8;
        }
    }
    out
}

/// Expand `frames` with `steps` dissolve frames per consecutive pair.
///
/// Identity when `steps` is 0 or the sequence has fewer than two frames.
pub fn expand(frames: Vec<RgbaImage>, steps: u32) -> Vec<RgbaImage> {
    if steps == 0 || frames.len() < 2 {
        return frames;
    }

    let mut out = Vec::with_capacity((frames.len() - 1) * steps as usize + 1);
    for pair in frames.windows(2) {
        for j in 0..steps {
            let alpha = j as f64 / steps as f64;
            out.push(blend(&pair[0], &pair[1], alpha));
        }
    }
    // Division above is guarded: steps > 0 on this path.
    if let Some(last) = frames.into_iter().next_back() {
        out.push(last);
    }
    out
}
