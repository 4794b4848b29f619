//! # gifit
//!
//! Turn a folder of still images into a single looping animated GIF.
//! Your filesystem is the data source: every `.png`/`.jpg`/`.jpeg` in a
//! directory becomes a frame, ordered lexicographically by filename.
//!
//! # Architecture: A Batch Transform Pipeline
//!
//! Frames flow through five transform stages and a container encoder,
//! each consuming the full sequence its predecessor produced:
//!
//! ```text
//! load       directory     → Vec<RgbaImage>   (decode + order)
//! transform  each frame    → box resample + palette quantization
//! dissolve   sequence      → cross-dissolve expansion ((n-1)·k + 1 frames)
//! dither     sequence      → one global palette + indexed frames
//! watermark  each frame    → outlined text overlay (before or after dither)
//! encode     sequence      → one GIF, uniform delay, infinite loop
//! ```
//!
//! Batch rather than streaming because two stages need more than one
//! frame at a time: the dissolve blends neighboring frames, and the
//! ditherer builds its palette from color statistics across the whole
//! sequence.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | [`PipelineConfig`](config::PipelineConfig): options record, `gifit.toml` loading, validation |
//! | [`loader`] | Directory enumeration, decode, ordering, progress events |
//! | [`transform`] | Area-averaging resample and color quantization |
//! | [`dissolve`] | Alpha-blended intermediate frame synthesis |
//! | [`dither`] | Global palette + None/Ordered/Floyd–Steinberg/Raster |
//! | [`watermark`] | System font resolution and outlined text compositing |
//! | [`encode`] | GIF container write: global palette, delays, loop-forever |
//! | [`pipeline`] | Stage sequencing, error taxonomy, event channel |
//! | [`output`] | CLI formatting of pipeline events |
//!
//! # Design Decisions
//!
//! ## Explicit Config, No Ambient State
//!
//! Every option travels in one immutable [`config::PipelineConfig`]
//! passed to [`pipeline::run`]. No stage reads globals, environment
//! variables, or UI state, so any front end — CLI, GUI, batch script —
//! drives the pipeline the same way.
//!
//! ## Truecolor Until the Last Possible Moment
//!
//! Quantization in the transform stage snaps pixels to a palette but
//! keeps them as RGBA, because the dissolve stage must blend continuous
//! channel values — interpolating palette indices produces nonsense
//! hues. Only the dither stage commits to indexed color, and a
//! post-dither watermark is re-snapped onto the same palette.
//!
//! ## Synchronous and Self-Contained
//!
//! The pipeline blocks the calling thread until the GIF is written or a
//! stage fails; it owns no cross-invocation state, so concurrent runs
//! on different folders need no coordination. Progress flows out
//! through an `mpsc` channel of [`pipeline::PipelineEvent`] values —
//! the only surface the core exposes toward a presentation layer.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding (`image`), quantization (`color_quant`), text rendering
//! (`imageproc` + `ab_glyph` + `fontdb`), and GIF encoding (`gif`) are
//! all pure Rust. No ImageMagick, no system codecs; the binary is fully
//! self-contained.

pub mod config;
pub mod dissolve;
pub mod dither;
pub mod encode;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod transform;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;
