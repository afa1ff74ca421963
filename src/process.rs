//! Batch cropping of files and directories.
//!
//! Takes a list of inputs from the command line, expands directories one
//! level deep, and crops every image into an output directory.
//!
//! ## Output naming
//!
//! ```text
//! photos/dawn.jpg      → out/dawn-crop.jpg
//! photos/scan.tiff     → out/scan-crop.png     # TIFF is not an output format
//! photos/dusk.png      → out/dusk-crop.webp    # with format = "webp"
//! more/dawn.jpg        → out/dawn-crop-2.jpg   # name already taken in this batch
//! ```
//!
//! ## Parallel Processing
//!
//! Files are cropped in parallel using [rayon](https://docs.rs/rayon). Results
//! come back in input order. A failing file is reported as a
//! [`CropEvent::Failed`] and counted in the summary; it never aborts the rest
//! of the batch.

use crate::config::Config;
use crate::imaging::rust_backend::is_supported_input;
use crate::imaging::{CropConfig, ImageBackend, RustBackend, SmartCropResult, Strategy, smart_crop};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("No supported images in the given inputs")]
    NoInputs,
}

/// Settings for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub crop: CropConfig,
    /// Appended to each input stem, joined with `-`.
    pub suffix: String,
    /// Output extension; `None` keeps the input's.
    pub format: Option<String>,
}

impl BatchConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            crop: config.crop.to_crop_config(),
            suffix: config.crop.suffix.clone(),
            format: config.crop.format.clone(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Progress events emitted while a batch runs. Indices are 1-based input positions.
#[derive(Debug, Clone, PartialEq)]
pub enum CropEvent {
    Cropped {
        index: usize,
        source: String,
        output: String,
        strategy: Option<Strategy>,
        width: u32,
        height: u32,
    },
    Failed {
        index: usize,
        source: String,
        error: String,
    },
}

/// A file that could not be cropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropFailure {
    pub source: String,
    pub error: String,
}

/// Everything a batch produced, in input order.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub cropped: Vec<SmartCropResult>,
    pub failures: Vec<CropFailure>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.cropped.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Expand `inputs` into a flat list of image files.
///
/// Files are taken as given, whatever their extension. Directories contribute
/// their supported images (not recursing), sorted by file name. Duplicates are
/// kept in first-seen order only once.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ProcessError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_supported_input(path))
                .collect();
            entries.sort();
            files.extend(entries);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(ProcessError::NotFound(input.clone()));
        }
    }

    let mut seen = HashSet::new();
    files.retain(|path| seen.insert(path.clone()));

    if files.is_empty() {
        return Err(ProcessError::NoInputs);
    }
    Ok(files)
}

/// Extension an output gets: the configured format, else the input's own,
/// with TIFF mapped to PNG since it can only be read.
fn output_extension(source: &Path, format: Option<&str>) -> String {
    if let Some(format) = format {
        return format.to_lowercase();
    }
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "tif" | "tiff" | "" => "png".to_string(),
        _ => ext,
    }
}

/// Where the crop of `source` is written: `<out_dir>/<stem>-<suffix>.<ext>`.
pub fn output_path(source: &Path, out_dir: &Path, suffix: &str, format: Option<&str>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = output_extension(source, format);
    out_dir.join(format!("{stem}-{suffix}.{ext}"))
}

/// Output paths for a whole batch, in input order.
///
/// When two inputs map to the same name the later one gets a counter,
/// `<stem>-<suffix>-2.<ext>`, so no two crops in a batch share a file.
pub fn output_paths(
    sources: &[PathBuf],
    out_dir: &Path,
    suffix: &str,
    format: Option<&str>,
) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let base = output_path(source, out_dir, suffix, format);
            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = numbered(&base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// `dir/name.ext` → `dir/name-<n>.ext`
fn numbered(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{stem}-{n}.{}", ext.to_string_lossy())),
        None => path.with_file_name(format!("{stem}-{n}")),
    }
}

/// Crop every input with the pure Rust backend.
pub fn crop_batch(
    inputs: &[PathBuf],
    out_dir: &Path,
    config: &BatchConfig,
    progress: Option<Sender<CropEvent>>,
) -> Result<BatchResult, ProcessError> {
    let sources = collect_inputs(inputs)?;
    crop_batch_with_backend(&RustBackend::new(), &sources, out_dir, config, progress)
}

/// Crop already-collected `sources` using a specific backend (allows testing with mock).
pub fn crop_batch_with_backend(
    backend: &impl ImageBackend,
    sources: &[PathBuf],
    out_dir: &Path,
    config: &BatchConfig,
    progress: Option<Sender<CropEvent>>,
) -> Result<BatchResult, ProcessError> {
    fs::create_dir_all(out_dir)?;
    log::info!(
        "cropping {} image(s) to {} with method {}",
        sources.len(),
        out_dir.display(),
        config.crop.method
    );

    let outputs = output_paths(sources, out_dir, &config.suffix, config.format.as_deref());
    let outcomes: Vec<(String, Result<SmartCropResult, String>)> = sources
        .par_iter()
        .zip(outputs.par_iter())
        .enumerate()
        .map_with(progress, |tx, (i, (source, output))| {
            let outcome = smart_crop(backend, source, output, &config.crop)
                .map_err(|e| e.to_string());
            let source_str = source.display().to_string();

            let event = match &outcome {
                Ok(result) => {
                    log::info!("{} → {}", result.source, result.output);
                    CropEvent::Cropped {
                        index: i + 1,
                        source: source_str.clone(),
                        output: result.output.clone(),
                        strategy: result.plan.strategy,
                        width: result.plan.width,
                        height: result.plan.height,
                    }
                }
                Err(error) => {
                    log::warn!("failed to crop {source_str}: {error}");
                    CropEvent::Failed {
                        index: i + 1,
                        source: source_str.clone(),
                        error: error.clone(),
                    }
                }
            };
            if let Some(tx) = tx {
                tx.send(event).ok();
            }
            (source_str, outcome)
        })
        .collect();

    let mut batch = BatchResult::default();
    for (source, outcome) in outcomes {
        match outcome {
            Ok(result) => batch.cropped.push(result),
            Err(error) => batch.failures.push(CropFailure { source, error }),
        }
    }
    log::info!(
        "{} cropped, {} failed",
        batch.succeeded(),
        batch.failed()
    );
    Ok(batch)
}
