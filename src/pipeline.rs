//! Pipeline orchestration.
//!
//! Wires the stages together in a fixed order and owns the error
//! taxonomy and progress events:
//!
//! ```text
//! load → transform → dissolve → dither ⇄ watermark → encode
//! ```
//!
//! Everything runs synchronously on the calling thread; [`run`] blocks
//! until the GIF is on disk or a stage has failed. Configuration is
//! validated and the watermark font resolved before any frame is read,
//! so a bad config or missing font never produces partial output. The
//! only non-fatal failure is a single file that won't decode, reported
//! as a [`PipelineEvent::FrameSkipped`].
//!
//! The dither/watermark order is configurable. When dithering runs
//! first, watermarked frames are promoted back to truecolor for
//! compositing and re-snapped onto the same palette, so the final color
//! count never re-expands.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig, StageOrder};
use crate::dither::{self, IndexedFrame};
use crate::encode::{self, EncodeError};
use crate::loader::{self, LoadError};
use crate::watermark::{WatermarkError, Watermarker};
use crate::{dissolve, transform};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Watermark error: {0}")]
    Watermark(#[from] WatermarkError),
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
}

/// Progress and outcome notifications, sent over an mpsc channel so a
/// host (CLI, GUI) can render them without the pipeline knowing how.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A frame decoded; `done` of `total` qualifying files are in.
    FrameLoaded { done: usize, total: usize },
    /// A qualifying file failed to decode and was skipped (non-fatal).
    FrameSkipped { path: PathBuf, reason: String },
    /// A transform stage began on `frames` frames.
    StageStarted {
        stage: &'static str,
        frames: usize,
    },
    /// The GIF was written.
    Encoded { path: PathBuf, frames: usize },
}

fn emit(events: Option<&Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Where the GIF lands: `output_dir` (default: the source directory's
/// parent) joined with `output_name` (default: the source directory's
/// base name) plus `.gif`.
pub fn resolve_output_path(source_dir: &Path, config: &PipelineConfig) -> PathBuf {
    let dir = config
        .output_dir
        .clone()
        .or_else(|| source_dir.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| source_dir.to_path_buf());

    let stem = config
        .output_name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            source_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "frames".to_string());

    dir.join(format!("{stem}.gif"))
}

/// Run the whole pipeline on `source_dir`, returning the written path.
///
/// Blocking and single-threaded; no state survives the call. Peak
/// memory is O(frames × dissolve_steps) once the dissolve stage has
/// expanded the sequence.
pub fn run(
    source_dir: &Path,
    config: &PipelineConfig,
    events: Option<&Sender<PipelineEvent>>,
) -> Result<PathBuf, PipelineError> {
    config.validate()?;

    // Fail on a missing font before any decoding work happens.
    let watermarker = if config.watermark.is_active() {
        Some(Watermarker::new(&config.watermark)?)
    } else {
        None
    };

    let frames = loader::load_frames(source_dir, events)?;

    emit(events, PipelineEvent::StageStarted {
        stage: "transform",
        frames: frames.len(),
    });
    let frames = transform::transform_sequence(frames, config);

    emit(events, PipelineEvent::StageStarted {
        stage: "dissolve",
        frames: frames.len(),
    });
    let frames = dissolve::expand(frames, config.dissolve_steps);

    emit(events, PipelineEvent::StageStarted {
        stage: "dither",
        frames: frames.len(),
    });
    let colors = config.effective_palette_size();
    let (palette, indexed) = match (&watermarker, config.stage_order) {
        (Some(wm), StageOrder::WatermarkFirst) => {
            let stamped = wm.apply_sequence(&frames);
            dither::dither_sequence(&stamped, colors, config.dither)
        }
        (Some(wm), StageOrder::DitherFirst) => {
            let (palette, indexed) = dither::dither_sequence(&frames, colors, config.dither);
            let restamped: Vec<IndexedFrame> = indexed
                .iter()
                .map(|frame| {
                    let stamped = wm.apply(&frame.to_rgba(&palette));
                    dither::snap_to_palette(&stamped, &palette)
                })
                .collect();
            (palette, restamped)
        }
        (None, _) => dither::dither_sequence(&frames, colors, config.dither),
    };

    let output_path = resolve_output_path(source_dir, config);
    encode::write_gif(&output_path, &palette, &indexed, config.frame_duration_ms)?;

    emit(events, PipelineEvent::Encoded {
        path: output_path.clone(),
        frames: indexed.len(),
    });
    Ok(output_path)
}
