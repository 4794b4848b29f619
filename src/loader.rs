//! Frame loading and ordering.
//!
//! First stage of the pipeline. Enumerates a single directory (no
//! recursion), keeps files whose extension is on the allow-list, and
//! decodes each into an RGBA frame. Lexicographic filename order defines
//! temporal order — `frame_001.png` plays before `frame_002.png`.
//!
//! Files that fail to decode are skipped with a [`FrameSkipped`] event
//! rather than aborting the run; only a directory that yields zero frames
//! is fatal ([`LoadError::EmptyInput`]). After each successful decode a
//! [`FrameLoaded`] event carries `(done, total)` so a host can render
//! progress.
//!
//! [`FrameSkipped`]: crate::pipeline::PipelineEvent::FrameSkipped
//! [`FrameLoaded`]: crate::pipeline::PipelineEvent::FrameLoaded

use crate::pipeline::PipelineEvent;
use image::{ImageReader, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No decodable frames found in {0}")]
    EmptyInput(PathBuf),
}

/// Extensions recognized as frames. Matched case-sensitively: `IMG.PNG`
/// is ignored.
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// True when the filename ends in one of the recognized extensions.
fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e))
}

/// List the qualifying frame files in `dir`, sorted by filename.
///
/// Does not decode anything; `check` mode and the loader both start here.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_frame_file(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Decode every qualifying file in `dir` into an ordered frame sequence.
///
/// Undecodable files are skipped (non-fatal); zero decoded frames is
/// [`LoadError::EmptyInput`].
pub fn load_frames(
    dir: &Path,
    events: Option<&Sender<PipelineEvent>>,
) -> Result<Vec<RgbaImage>, LoadError> {
    let files = list_frame_files(dir)?;
    let total = files.len();

    let mut frames = Vec::with_capacity(total);
    for (i, path) in files.iter().enumerate() {
        match decode_frame(path) {
            Ok(frame) => {
                frames.push(frame);
                if let Some(tx) = events {
                    let _ = tx.send(PipelineEvent::FrameLoaded {
                        done: i + 1,
                        total,
                    });
                }
            }
            Err(reason) => {
                if let Some(tx) = events {
                    let _ = tx.send(PipelineEvent::FrameSkipped {
                        path: path.clone(),
                        reason,
                    });
                }
            }
        }
    }

    if frames.is_empty() {
        return Err(LoadError::EmptyInput(dir.to_path_buf()));
    }
    Ok(frames)
}

/// Decode a single file to RGBA.
fn decode_frame(path: &Path) -> Result<RgbaImage, String> {
    ImageReader::open(path)
        .map_err(|e| e.to_string())?
        .decode()
        .map(|img| img.to_rgba8())
        .map_err(|e| e.to_string())
}
