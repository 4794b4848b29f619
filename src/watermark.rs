//! Text watermark compositing.
//!
//! Optional stage, active only when the configured watermark text is
//! non-empty. The text is rasterized once per frame onto a transparent
//! overlay: first an outline pass (the text offset ±2 px in the four
//! cardinal directions, in black), then the white fill on top. The
//! overlay is composited at partial opacity so the mark stays legible
//! over varying backgrounds without obliterating them.
//!
//! Placement: always centered horizontally; vertically anchored near the
//! top edge, centered, or near the bottom edge per the config.
//!
//! Fonts are resolved against the system font database by family name.
//! An unresolvable face is [`WatermarkError::FontNotFound`], naming the
//! face; when no face is configured the generic sans-serif family is
//! used. Compositing needs alpha support, so this stage operates on
//! truecolor frames — when it runs after the dither stage the pipeline
//! promotes frames back to RGBA first and re-snaps afterwards.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use thiserror::Error;

use crate::config::{Anchor, WatermarkConfig};

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Font face not found: {face:?}")]
    FontNotFound { face: String },
    #[error("Font data unusable for face {face:?}")]
    FontLoad { face: String },
}

/// Overlay opacity applied when compositing the rendered text.
const WATERMARK_OPACITY: f32 = 0.75;

/// Outline offset in pixels, drawn in the four cardinal directions.
const OUTLINE_OFFSET: i32 = 2;

/// Distance kept from the frame edge for top/bottom anchors.
const EDGE_MARGIN: i32 = 4;

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A resolved watermark: font loaded, ready to stamp frames.
#[derive(Debug)]
pub struct Watermarker {
    font: FontVec,
    text: String,
    scale: PxScale,
    anchor: Anchor,
}

impl Watermarker {
    /// Resolve the configured font face and prepare the stamp.
    pub fn new(config: &WatermarkConfig) -> Result<Self, WatermarkError> {
        let font = resolve_font(config.font_face.as_deref())?;
        Ok(Self {
            font,
            text: config.text.clone(),
            scale: PxScale::from(config.font_size),
            anchor: config.anchor,
        })
    }

    /// Composite the watermark onto one frame, returning a new frame.
    pub fn apply(&self, frame: &RgbaImage) -> RgbaImage {
        let (w, h) = frame.dimensions();
        let (tw, th) = text_size(self.scale, &self.font, &self.text);

        let x = (w as i32 - tw as i32) / 2;
        let y = match self.anchor {
            Anchor::Top => EDGE_MARGIN,
            Anchor::Center => (h as i32 - th as i32) / 2,
            Anchor::Bottom => h as i32 - th as i32 - EDGE_MARGIN,
        };

        let mut overlay = RgbaImage::new(w, h);
        for (dx, dy) in [
            (-OUTLINE_OFFSET, 0),
            (OUTLINE_OFFSET, 0),
            (0, -OUTLINE_OFFSET),
            (0, OUTLINE_OFFSET),
        ] {
            draw_text_mut(
                &mut overlay,
                OUTLINE,
                x + dx,
                y + dy,
                self.scale,
                &self.font,
                &self.text,
            );
        }
        draw_text_mut(&mut overlay, FILL, x, y, self.scale, &self.font, &self.text);

        let mut out = frame.clone();
        composite_over(&mut out, &overlay, WATERMARK_OPACITY);
        out
    }

    /// Stamp every frame of the sequence.
    pub fn apply_sequence(&self, frames: &[RgbaImage]) -> Vec<RgbaImage> {
        frames.iter().map(|f| self.apply(f)).collect()
    }
}

/// Source-over composite of `overlay` onto `base`, with the overlay's
/// alpha scaled by `opacity`. Base alpha is preserved.
fn composite_over(base: &mut RgbaImage, overlay: &RgbaImage, opacity: f32) {
    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        let a = (src.0[3] as f32 / 255.0) * opacity;
        if a <= 0.0 {
            continue;
        }
        for i in 0..3 {
            dst.0[i] = (src.0[i] as f32 * a + dst.0[i] as f32 * (1.0 - a)).round() as u8;
        }
    }
}

/// Look up a font by family name in the system font database.
fn resolve_font(face: Option<&str>) -> Result<FontVec, WatermarkError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let families = [match face {
        Some(name) => fontdb::Family::Name(name),
        None => fontdb::Family::SansSerif,
    }];
    let query = fontdb::Query {
        families: &families,
        ..fontdb::Query::default()
    };

    let face_name = || face.unwrap_or("sans-serif").to_string();
    let id = db.query(&query).ok_or_else(|| WatermarkError::FontNotFound {
        face: face_name(),
    })?;

    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
    })
    .ok_or_else(|| WatermarkError::FontNotFound { face: face_name() })?
    .map_err(|_| WatermarkError::FontLoad { face: face_name() })
}
