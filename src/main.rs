use clap::{Parser, Subcommand};
use gifit::{config, loader, output, pipeline};
use std::path::PathBuf;

/// Option overrides shared by commands that run the pipeline.
///
/// Anything left unset falls back to `gifit.toml` in the source
/// directory, then to the stock defaults.
#[derive(clap::Args, Clone)]
struct PipelineArgs {
    /// Geometric scale factor applied to every frame (e.g. 0.5)
    #[arg(long)]
    resample: Option<f64>,

    /// Reduce to at most this many colors (1-256)
    #[arg(long)]
    colors: Option<u16>,

    /// Dithering method: none | ordered | floyd-steinberg | raster
    #[arg(long)]
    dither: Option<String>,

    /// Cross-dissolve frames inserted between each consecutive pair
    #[arg(long)]
    dissolve: Option<u32>,

    /// Per-frame display time in milliseconds
    #[arg(long)]
    duration_ms: Option<u32>,

    /// Output filename stem (defaults to the source directory's name)
    #[arg(long)]
    output_name: Option<String>,

    /// Directory to write the GIF into (defaults to the source's parent)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Stage ordering: dither-first | watermark-first
    #[arg(long)]
    stage_order: Option<String>,

    /// Watermark text composited onto every frame
    #[arg(long)]
    watermark: Option<String>,

    /// Watermark font family (defaults to the system sans-serif)
    #[arg(long)]
    watermark_font: Option<String>,

    /// Watermark font size in pixels
    #[arg(long)]
    watermark_size: Option<f32>,

    /// Watermark anchor: top | center | bottom
    #[arg(long)]
    watermark_anchor: Option<String>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // One small leak, once per process
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "gifit")]
#[command(about = "Turn a folder of still images into a looping GIF")]
#[command(long_about = "\
Turn a folder of still images into a looping GIF

Every .png/.jpg/.jpeg in the source directory becomes a frame, ordered
lexicographically by filename. The pipeline can resample frames, reduce
colors with optional dithering, insert cross-dissolve frames between
originals, and stamp a text watermark, then writes one infinitely
looping GIF next to the source directory.

Example layout:

  shoots/
  └── sunset/                  # Source directory
      ├── gifit.toml           # Optional per-folder config
      ├── 001.png              # Frames, played in filename order
      ├── 002.png
      └── 003.jpg

  gifit build shoots/sunset    →  shoots/sunset.gif

CLI flags override gifit.toml values; run 'gifit gen-config' for a
documented config file with every option.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline: load → transform → dissolve → dither/watermark → encode
    Build {
        /// Source directory of frames
        source: PathBuf,
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Validate the source directory and config without writing anything
    Check {
        /// Source directory of frames
        source: PathBuf,
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Print a stock gifit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { source, args } => {
            let config = resolve_config(&source, &args)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_event(&event) {
                        println!("{}", line);
                    }
                }
            });

            let result = pipeline::run(&source, &config, Some(&tx));
            drop(tx);
            printer.join().unwrap();

            let path = result?;
            println!("==> Done: {}", path.display());
        }
        Command::Check { source, args } => {
            let config = resolve_config(&source, &args)?;
            println!("==> Checking {}", source.display());

            let files = loader::list_frame_files(&source)?;
            if files.is_empty() {
                return Err(format!("no qualifying frames in {}", source.display()).into());
            }
            for file in &files {
                println!(
                    "  {}",
                    file.file_name().unwrap_or_default().to_string_lossy()
                );
            }
            println!(
                "==> {} frames, would write {}",
                files.len(),
                pipeline::resolve_output_path(&source, &config).display()
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Layer CLI flags over the source directory's `gifit.toml`.
fn resolve_config(
    source: &std::path::Path,
    args: &PipelineArgs,
) -> Result<config::PipelineConfig, config::ConfigError> {
    let mut cfg = config::load_config(source)?;

    if let Some(factor) = args.resample {
        cfg.resample_factor = factor;
    }
    if let Some(colors) = args.colors {
        cfg.palette_size = Some(colors);
    }
    if let Some(method) = &args.dither {
        cfg.dither = method.parse()?;
    }
    if let Some(steps) = args.dissolve {
        cfg.dissolve_steps = steps;
    }
    if let Some(ms) = args.duration_ms {
        cfg.frame_duration_ms = ms;
    }
    if let Some(name) = &args.output_name {
        cfg.output_name = Some(name.clone());
    }
    if let Some(dir) = &args.output_dir {
        cfg.output_dir = Some(dir.clone());
    }
    if let Some(order) = &args.stage_order {
        cfg.stage_order = order.parse()?;
    }
    if let Some(text) = &args.watermark {
        cfg.watermark.text = text.clone();
    }
    if let Some(font) = &args.watermark_font {
        cfg.watermark.font_face = Some(font.clone());
    }
    if let Some(size) = args.watermark_size {
        cfg.watermark.font_size = size;
    }
    if let Some(anchor) = &args.watermark_anchor {
        cfg.watermark.anchor = anchor.parse()?;
    }

    cfg.validate()?;
    Ok(cfg)
}
