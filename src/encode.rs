//! Animated GIF container encoding.
//!
//! Final stage of the pipeline. Writes the indexed sequence as a single
//! GIF: the shared palette becomes the global color table, every frame
//! gets the same delay, and the loop count is set to repeat forever.
//!
//! GIF stores delays in centiseconds, so `frame_duration_ms` rounds down
//! to a floor of 1 cs (10 ms). An existing file at the output path is
//! silently overwritten — callers wanting a guard must check first. A
//! failure mid-write removes the partial file so a broken GIF is never
//! left looking like success.

use gif::{Encoder, Frame, Repeat};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::dither::IndexedFrame;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GIF encoding failed: {0}")]
    Format(#[from] gif::EncodingError),
    #[error("Cannot encode an empty frame sequence")]
    EmptySequence,
    #[error("Frame {index} is {got_width}x{got_height}, expected {width}x{height}")]
    DimensionMismatch {
        index: usize,
        got_width: u32,
        got_height: u32,
        width: u32,
        height: u32,
    },
    #[error("Frame dimensions {0}x{1} exceed the GIF limit of 65535")]
    FrameTooLarge(u32, u32),
}

/// Delay for one frame in GIF centisecond units, floored at 1.
fn delay_centis(duration_ms: u32) -> u16 {
    (duration_ms / 10).clamp(1, u16::MAX as u32) as u16
}

/// Write the sequence to `path` as a looping GIF.
///
/// Fails before any byte is written if the sequence is empty, a frame's
/// dimensions disagree with the first frame's, or the frames exceed the
/// format's 16-bit dimension limit.
pub fn write_gif(
    path: &Path,
    palette: &[[u8; 3]],
    frames: &[IndexedFrame],
    frame_duration_ms: u32,
) -> Result<(), EncodeError> {
    let first = frames.first().ok_or(EncodeError::EmptySequence)?;
    let (width, height) = (first.width, first.height);
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(EncodeError::FrameTooLarge(width, height));
    }
    for (index, frame) in frames.iter().enumerate() {
        if (frame.width, frame.height) != (width, height) {
            return Err(EncodeError::DimensionMismatch {
                index,
                got_width: frame.width,
                got_height: frame.height,
                width,
                height,
            });
        }
    }

    let result = write_frames(path, palette, frames, width, height, frame_duration_ms);
    if result.is_err() {
        // Drop the partial file rather than presenting it as output.
        let _ = std::fs::remove_file(path);
    }
    result
}

fn write_frames(
    path: &Path,
    palette: &[[u8; 3]],
    frames: &[IndexedFrame],
    width: u32,
    height: u32,
    frame_duration_ms: u32,
) -> Result<(), EncodeError> {
    let flat_palette: Vec<u8> = palette.iter().flatten().copied().collect();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut encoder = Encoder::new(&mut writer, width as u16, height as u16, &flat_palette)?;
    encoder.set_repeat(Repeat::Infinite)?;

    let delay = delay_centis(frame_duration_ms);
    for indexed in frames {
        let frame = Frame {
            width: width as u16,
            height: height as u16,
            buffer: Cow::Borrowed(&indexed.data),
            delay,
            ..Frame::default()
        };
        encoder.write_frame(&frame)?;
    }
    drop(encoder);
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, index: u8) -> IndexedFrame {
        IndexedFrame {
            width,
            height,
            data: vec![index; (width * height) as usize],
        }
    }

    fn two_tone_palette() -> Vec<[u8; 3]> {
        vec![[0, 0, 0], [255, 255, 255]]
    }

    #[test]
    fn delay_rounds_down_with_floor() {
        assert_eq!(delay_centis(100), 10);
        assert_eq!(delay_centis(109), 10);
        assert_eq!(delay_centis(9), 1);
        assert_eq!(delay_centis(1), 1);
    }

    #[test]
    fn empty_sequence_rejected_without_writing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        let err = write_gif(&path, &two_tone_palette(), &[], 100).unwrap_err();
        assert!(matches!(err, EncodeError::EmptySequence));
        assert!(!path.exists());
    }

    #[test]
    fn dimension_mismatch_rejected_without_writing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        let frames = vec![solid_frame(4, 4, 0), solid_frame(4, 5, 1)];
        let err = write_gif(&path, &two_tone_palette(), &frames, 100).unwrap_err();
        assert!(matches!(err, EncodeError::DimensionMismatch { index: 1, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn round_trip_preserves_count_delay_and_loop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("loop.gif");
        let frames = vec![
            solid_frame(6, 4, 0),
            solid_frame(6, 4, 1),
            solid_frame(6, 4, 0),
        ];
        write_gif(&path, &two_tone_palette(), &frames, 120).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(File::open(&path).unwrap()).unwrap();
        assert_eq!(decoder.repeat(), Repeat::Infinite);
        assert_eq!(decoder.width(), 6);
        assert_eq!(decoder.height(), 4);

        let mut count = 0;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert_eq!(frame.delay, 12);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn decoded_pixels_match_palette_entries() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pixels.gif");
        write_gif(&path, &two_tone_palette(), &[solid_frame(2, 2, 1)], 50).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(File::open(&path).unwrap()).unwrap();
        let frame = decoder.read_next_frame().unwrap().unwrap();
        assert_eq!(&frame.buffer[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        std::fs::write(&path, b"stale").unwrap();

        write_gif(&path, &two_tone_palette(), &[solid_frame(2, 2, 0)], 100).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }
}
