use clap::{Parser, Subcommand};
use focal_crop::imaging::{
    AspectRatio, FocalMethod, ImageBackend, PixelView, RustBackend, compare_methods,
    estimate_with_strategy, rule_of_thirds_points,
};
use focal_crop::{config, output, process};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "focal-crop")]
#[command(about = "Crop photos to an aspect ratio around their most interesting point")]
#[command(long_about = "\
Crop photos to an aspect ratio around their most interesting point

The crop window is the largest rectangle of the target aspect ratio that fits
inside the image. Its position is centered on a focal point found by a cheap
block heuristic, then clamped so it never leaves the image.

Focal methods:
  auto              skin-tone blocks, falling back to edge density
  face              skin-tone blocks only
  edge              32px blocks with the most luminance edges
  contrast          40px blocks with the widest brightness range
  center            no focal point, plain center crop
  thirds:<quadrant> a rule-of-thirds intersection
                    (top-left, top-right, bottom-left, bottom-right)

Settings are read from ./focal-crop.toml when present; flags override them.
Run 'focal-crop gen-config' to generate a documented config file.

Set RUST_LOG=debug to see which heuristic picked each point.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults to ./focal-crop.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by commands that pick a crop window.
#[derive(clap::Args, Clone)]
struct AspectArgs {
    /// Target aspect ratio: W:H, a decimal, or a preset (square, golden, ...)
    #[arg(long, short)]
    aspect: Option<AspectRatio>,
}

#[derive(Subcommand)]
enum Command {
    /// Crop images or directories of images
    Crop {
        /// Image files, or directories to scan one level deep
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        aspect: AspectArgs,

        /// Output width in pixels (0 keeps the crop width)
        #[arg(long, short)]
        width: Option<u32>,

        /// Focal point method
        #[arg(long, short)]
        method: Option<FocalMethod>,

        /// JPEG quality (1-100)
        #[arg(long, short)]
        quality: Option<u32>,

        /// Directory to write crops into
        #[arg(long, short, default_value = "cropped")]
        out_dir: PathBuf,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the focal point of one image
    Focus {
        input: PathBuf,

        /// Focal point method
        #[arg(long, short)]
        method: Option<FocalMethod>,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compare face, edge and contrast on one image
    Compare {
        input: PathBuf,

        #[command(flatten)]
        aspect: AspectArgs,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the four rule-of-thirds intersections of one image
    Thirds {
        input: PathBuf,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock focal-crop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    let backend = RustBackend::new();

    match cli.command {
        Command::Crop {
            inputs,
            aspect,
            width,
            method,
            quality,
            out_dir,
            json,
        } => {
            if let Some(aspect) = aspect.aspect {
                config.crop.aspect_ratio = aspect;
            }
            if let Some(width) = width {
                config.crop.output_width = width;
            }
            if let Some(method) = method {
                config.crop.method = method;
            }
            if let Some(quality) = quality {
                config.crop.quality = quality;
            }
            config.validate()?;
            init_thread_pool(&config.processing);

            let batch_config = process::BatchConfig::from_config(&config);
            let result = if json {
                process::crop_batch(&inputs, &out_dir, &batch_config, None)?
            } else {
                let (tx, rx) = std::sync::mpsc::channel();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_crop_event(&event) {
                            println!("{}", line);
                        }
                    }
                });
                let result = process::crop_batch(&inputs, &out_dir, &batch_config, Some(tx));
                printer.join().ok();
                result?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_batch_summary(&result);
            }
            if result.failed() > 0 {
                return Err(format!(
                    "{} of {} images failed",
                    result.failed(),
                    result.failed() + result.succeeded()
                )
                .into());
            }
        }
        Command::Focus {
            input,
            method,
            json,
        } => {
            let method = method.unwrap_or(config.crop.method);
            let pixels = backend.load_pixels(&input)?;
            let view = PixelView::from_rgba(&pixels)?;
            let found = estimate_with_strategy(&view, method);
            let source = input.display().to_string();

            if json {
                let report = serde_json::json!({
                    "source": source,
                    "width": view.width(),
                    "height": view.height(),
                    "method": method,
                    "strategy": found.map(|(strategy, _)| strategy),
                    "focal_point": found.map(|(_, point)| point),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_focus(&source, pixels.dimensions(), method, found);
            }
        }
        Command::Compare {
            input,
            aspect,
            json,
        } => {
            let aspect = aspect.aspect.unwrap_or(config.crop.aspect_ratio);
            let outcomes = compare_methods(&backend, &input, &aspect)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                output::print_compare(&input.display().to_string(), &outcomes);
            }
        }
        Command::Thirds { input, json } => {
            let dims = backend.identify(&input)?;
            let points = rule_of_thirds_points(dims.width, dims.height);
            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                output::print_thirds((dims.width, dims.height), &points);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
