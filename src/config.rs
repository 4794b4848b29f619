//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is the single, fully resolved record of options the
//! pipeline entry point consumes. Nothing downstream reads ambient state —
//! whatever front end drives the crate builds one of these (from CLI flags,
//! a config file, or both) and hands it in once.
//!
//! ## Config File
//!
//! An optional `gifit.toml` next to the invocation can pre-set any option;
//! CLI flags override file values:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! resample_factor = 1.0        # Geometric scale, any positive number
//! # palette_size = 256         # 1-256; omit for no color reduction
//! dither = "none"              # none | ordered | floyd-steinberg | raster
//! dissolve_steps = 0           # Blended frames inserted between each pair
//! frame_duration_ms = 100      # Per-frame display time
//! stage_order = "dither-first" # dither-first | watermark-first
//! # output_name = "my-loop"    # Defaults to the source directory's name
//!
//! [watermark]
//! text = ""                    # Empty = no watermark
//! # font_face = "DejaVu Sans"  # Omit for the system sans-serif
//! font_size = 20.0
//! anchor = "bottom"            # top | center | bottom
//! ```
//!
//! Unknown keys are rejected to catch typos early. Enumerated options that
//! don't match a recognized value fail with [`ConfigError::InvalidValue`]
//! before any frame is read.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unrecognized {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Dithering method applied when reducing frames to indexed color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMethod {
    /// Plain nearest-color mapping, no dither pattern.
    #[default]
    None,
    /// 4x4 Bayer matrix threshold bias.
    Ordered,
    /// Floyd–Steinberg error diffusion.
    FloydSteinberg,
    /// Two-level checkerboard threshold bias.
    Raster,
}

impl FromStr for DitherMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "ordered" => Ok(Self::Ordered),
            "floyd-steinberg" => Ok(Self::FloydSteinberg),
            "raster" => Ok(Self::Raster),
            other => Err(ConfigError::InvalidValue {
                field: "dither method",
                value: other.to_string(),
            }),
        }
    }
}

/// Vertical placement of the watermark text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    Top,
    Center,
    #[default]
    Bottom,
}

impl FromStr for Anchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            other => Err(ConfigError::InvalidValue {
                field: "anchor",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether color reduction runs before or after the watermark.
///
/// Both orders are valid: dither-first keeps the watermark crisp on top of
/// the reduced palette (the text is re-snapped to the same palette without a
/// second dither pass); watermark-first lets the text participate in the
/// dither pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageOrder {
    #[default]
    DitherFirst,
    WatermarkFirst,
}

impl FromStr for StageOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dither-first" => Ok(Self::DitherFirst),
            "watermark-first" => Ok(Self::WatermarkFirst),
            other => Err(ConfigError::InvalidValue {
                field: "stage order",
                value: other.to_string(),
            }),
        }
    }
}

/// Text overlay settings. Active only when `text` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Text to composite onto every frame. Empty disables the stage.
    pub text: String,
    /// Font family name, resolved against the system font database.
    /// When absent, the generic sans-serif family is used.
    pub font_face: Option<String>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Vertical anchor; text is always centered horizontally.
    pub anchor: Anchor,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_face: None,
            font_size: 20.0,
            anchor: Anchor::default(),
        }
    }
}

impl WatermarkConfig {
    /// The stage runs only when there is text to draw.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Fully resolved pipeline options.
///
/// All fields have defaults matching a straight frames-to-GIF conversion:
/// no scaling, no color reduction, no dissolve, no watermark, 100 ms per
/// frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Geometric scale applied to every frame (`round(dim * factor)`).
    pub resample_factor: f64,
    /// Target color count, 1-256. `None` skips quantization in the
    /// transform stage (the ditherer still caps at 256 for encoding).
    pub palette_size: Option<u16>,
    /// Dithering method for the indexed-color conversion.
    pub dither: DitherMethod,
    /// Blended frames inserted between each consecutive pair. 0 = none.
    pub dissolve_steps: u32,
    /// Display duration of every frame, in milliseconds.
    pub frame_duration_ms: u32,
    /// Dither/watermark ordering.
    pub stage_order: StageOrder,
    /// Output filename stem. Defaults to the source directory's base name.
    pub output_name: Option<String>,
    /// Directory the GIF is written into. Defaults to the source
    /// directory's parent.
    pub output_dir: Option<PathBuf>,
    /// Text overlay settings.
    pub watermark: WatermarkConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resample_factor: 1.0,
            palette_size: None,
            dither: DitherMethod::default(),
            dissolve_steps: 0,
            frame_duration_ms: 100,
            stage_order: StageOrder::default(),
            output_name: None,
            output_dir: None,
            watermark: WatermarkConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate option values are within acceptable ranges.
    ///
    /// Runs before any frame is read so a bad config never produces
    /// partial output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resample_factor.is_finite() || self.resample_factor <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "resample_factor must be a positive number, got {}",
                self.resample_factor
            )));
        }
        if let Some(size) = self.palette_size {
            if !(1..=256).contains(&size) {
                return Err(ConfigError::Validation(format!(
                    "palette_size must be 1-256, got {size}"
                )));
            }
        }
        if self.frame_duration_ms == 0 {
            return Err(ConfigError::Validation(
                "frame_duration_ms must be positive".into(),
            ));
        }
        if self.watermark.is_active() && self.watermark.font_size <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "watermark.font_size must be positive, got {}",
                self.watermark.font_size
            )));
        }
        Ok(())
    }

    /// Effective color count for the indexed conversion: the configured
    /// palette size when set, else the GIF maximum of 256.
    pub fn effective_palette_size(&self) -> u16 {
        self.palette_size.unwrap_or(256)
    }
}

/// Load config from `gifit.toml` in the given directory, or defaults if
/// the file doesn't exist.
pub fn load_config(dir: &Path) -> Result<PipelineConfig, ConfigError> {
    let path = dir.join("gifit.toml");
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let config: PipelineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// A documented stock `gifit.toml` with every option at its default.
pub fn stock_config_toml() -> String {
    r#"# gifit configuration. All options are optional; defaults shown.

# Geometric scale applied to every frame. Any positive number.
resample_factor = 1.0

# Target color count, 1-256. Omit for no reduction before encoding.
# palette_size = 256

# Dithering for the final indexed conversion:
# none | ordered | floyd-steinberg | raster
dither = "none"

# Cross-dissolve: blended frames inserted between each consecutive pair.
dissolve_steps = 0

# Per-frame display time in milliseconds. GIF timing has 10 ms
# granularity, so values round down with a floor of 10 ms.
frame_duration_ms = 100

# Whether color reduction runs before or after the watermark:
# dither-first | watermark-first
stage_order = "dither-first"

# Output filename stem. Defaults to the source directory's name.
# output_name = "my-loop"

[watermark]
# Text composited onto every frame. Empty = no watermark.
text = ""
# Font family, resolved against the system fonts. Omit for sans-serif.
# font_face = "DejaVu Sans"
font_size = 20.0
# top | center | bottom (always centered horizontally)
anchor = "bottom"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn dither_method_parses_recognized_values() {
        assert_eq!("none".parse::<DitherMethod>().unwrap(), DitherMethod::None);
        assert_eq!(
            "floyd-steinberg".parse::<DitherMethod>().unwrap(),
            DitherMethod::FloydSteinberg
        );
        assert_eq!(
            "ordered".parse::<DitherMethod>().unwrap(),
            DitherMethod::Ordered
        );
        assert_eq!(
            "raster".parse::<DitherMethod>().unwrap(),
            DitherMethod::Raster
        );
    }

    #[test]
    fn dither_method_rejects_unknown() {
        let err = "nonexistent".parse::<DitherMethod>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "dither method", ref value } if value == "nonexistent"
        ));
    }

    #[test]
    fn anchor_rejects_unknown() {
        assert!("middle".parse::<Anchor>().is_err());
        assert_eq!("center".parse::<Anchor>().unwrap(), Anchor::Center);
    }

    #[test]
    fn zero_resample_factor_rejected() {
        let config = PipelineConfig {
            resample_factor: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn palette_size_range_enforced() {
        let mut config = PipelineConfig {
            palette_size: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.palette_size = Some(257);
        assert!(config.validate().is_err());
        config.palette_size = Some(1);
        config.validate().unwrap();
    }

    #[test]
    fn zero_duration_rejected() {
        let config = PipelineConfig {
            frame_duration_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn watermark_active_only_with_text() {
        assert!(!WatermarkConfig::default().is_active());
        let wm = WatermarkConfig {
            text: "hello".into(),
            ..Default::default()
        };
        assert!(wm.is_active());
    }

    #[test]
    fn effective_palette_size_defaults_to_256() {
        assert_eq!(PipelineConfig::default().effective_palette_size(), 256);
        let config = PipelineConfig {
            palette_size: Some(32),
            ..Default::default()
        };
        assert_eq!(config.effective_palette_size(), 32);
    }

    #[test]
    fn stock_toml_round_trips() {
        let config: PipelineConfig = toml::from_str(&stock_config_toml()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("frame_speed = 100");
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str("dissolve_steps = 3").unwrap();
        assert_eq!(config.dissolve_steps, 3);
        assert_eq!(config.frame_duration_ms, 100);
    }

    #[test]
    fn load_config_missing_file_is_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("gifit.toml"),
            "dissolve_steps = 2\ndither = \"ordered\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.dissolve_steps, 2);
        assert_eq!(config.dither, DitherMethod::Ordered);
    }

    #[test]
    fn load_config_invalid_values_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("gifit.toml"), "frame_duration_ms = 0\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }
}
