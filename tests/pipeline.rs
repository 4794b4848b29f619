//! End-to-end pipeline tests: real frames on disk in, decoded GIF out.

use gifit::config::{DitherMethod, PipelineConfig, WatermarkConfig};
use gifit::pipeline;
use image::{Rgba, RgbaImage};
use std::fs::File;
use std::path::Path;

/// Write a PNG frame with a solid color.
fn write_frame(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

fn decode_gif(path: &Path) -> (u16, u16, gif::Repeat, Vec<u16>) {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(File::open(path).unwrap()).unwrap();
    let (w, h, repeat) = (decoder.width(), decoder.height(), decoder.repeat());
    let mut delays = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        delays.push(frame.delay);
    }
    (w, h, repeat, delays)
}

#[test]
fn three_frames_with_dissolve_round_trip() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("clip");
    std::fs::create_dir(&source).unwrap();
    write_frame(&source.join("a.png"), 8, 8, [255, 0, 0, 255]);
    write_frame(&source.join("b.png"), 8, 8, [0, 255, 0, 255]);
    write_frame(&source.join("c.png"), 8, 8, [0, 0, 255, 255]);
    std::fs::write(source.join("readme.txt"), "not a frame").unwrap();

    let config = PipelineConfig {
        dissolve_steps: 2,
        frame_duration_ms: 120,
        palette_size: Some(32),
        dither: DitherMethod::FloydSteinberg,
        ..Default::default()
    };
    let path = pipeline::run(&source, &config, None).unwrap();
    assert_eq!(path, tmp.path().join("clip.gif"));

    let (w, h, repeat, delays) = decode_gif(&path);
    assert_eq!((w, h), (8, 8));
    assert_eq!(repeat, gif::Repeat::Infinite);
    // (3-1)*2 + 1 frames, each at 120 ms = 12 cs
    assert_eq!(delays.len(), 5);
    assert!(delays.iter().all(|&d| d == 12));
}

#[test]
fn resample_factor_changes_output_dimensions() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("big");
    std::fs::create_dir(&source).unwrap();
    write_frame(&source.join("a.png"), 16, 12, [10, 20, 30, 255]);
    write_frame(&source.join("b.png"), 16, 12, [200, 100, 50, 255]);

    let config = PipelineConfig {
        resample_factor: 0.5,
        ..Default::default()
    };
    let path = pipeline::run(&source, &config, None).unwrap();

    let (w, h, _, delays) = decode_gif(&path);
    assert_eq!((w, h), (8, 6));
    assert_eq!(delays.len(), 2);
}

#[test]
fn unknown_dither_string_fails_before_any_output() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("clip");
    std::fs::create_dir(&source).unwrap();
    write_frame(&source.join("a.png"), 8, 8, [1, 2, 3, 255]);

    // The enumerated option is rejected at parse time, so the pipeline
    // never starts and nothing is written.
    assert!("nonexistent".parse::<DitherMethod>().is_err());
    assert!(!tmp.path().join("clip.gif").exists());
}

#[test]
fn output_name_override_and_overwrite() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("clip");
    std::fs::create_dir(&source).unwrap();
    write_frame(&source.join("a.png"), 4, 4, [9, 9, 9, 255]);

    let stale = tmp.path().join("named.gif");
    std::fs::write(&stale, b"stale").unwrap();

    let config = PipelineConfig {
        output_name: Some("named".into()),
        ..Default::default()
    };
    let path = pipeline::run(&source, &config, None).unwrap();
    assert_eq!(path, stale);
    assert!(std::fs::read(&path).unwrap().starts_with(b"GIF89a"));
}

#[test]
fn watermarked_build_still_round_trips() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("clip");
    std::fs::create_dir(&source).unwrap();
    write_frame(&source.join("a.png"), 32, 32, [0, 0, 0, 255]);
    write_frame(&source.join("b.png"), 32, 32, [255, 255, 255, 255]);

    let config = PipelineConfig {
        watermark: WatermarkConfig {
            text: "WM".into(),
            font_size: 12.0,
            ..Default::default()
        },
        palette_size: Some(16),
        ..Default::default()
    };
    // Hosts without system fonts can't run this path.
    match pipeline::run(&source, &config, None) {
        Ok(path) => {
            let (w, h, repeat, delays) = decode_gif(&path);
            assert_eq!((w, h), (32, 32));
            assert_eq!(repeat, gif::Repeat::Infinite);
            assert_eq!(delays.len(), 2);
        }
        Err(gifit::pipeline::PipelineError::Watermark(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}
