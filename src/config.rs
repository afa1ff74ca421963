//! Crop configuration module.
//!
//! Handles loading, validating, and merging `focal-crop.toml` files. Stock
//! defaults are the base layer; a user file only needs the keys it wants to
//! override, and command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [crop]
//! aspect_ratio = "16:9"     # W:H, a decimal, or a preset name
//! method = "auto"           # auto | face | edge | contrast | center | thirds:<quadrant>
//! output_width = 800        # 0 keeps the crop's own width
//! quality = 90              # JPEG quality (1-100)
//! suffix = "crop"           # photo.jpg → photo-crop.jpg
//! # format = "webp"         # jpg | png | webp; omit to keep the input format
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{AspectRatio, CropConfig, FocalMethod, MAX_OUTPUT_SIDE, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "focal-crop.toml";

/// Output formats the renderer can encode.
pub const OUTPUT_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `focal-crop.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// What to crop and how to encode it.
    pub crop: CropSection,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

/// Crop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropSection {
    /// Target aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Focal point method.
    pub method: FocalMethod,
    /// Output width in pixels; 0 keeps the crop's own width.
    pub output_width: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Appended to the input stem to name outputs.
    pub suffix: String,
    /// Output extension; `None` keeps the input's.
    pub format: Option<String>,
}

impl Default for CropSection {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            method: FocalMethod::Auto,
            output_width: 800,
            quality: 90,
            suffix: "crop".to_string(),
            format: None,
        }
    }
}

impl CropSection {
    /// The operation-level config these settings describe.
    pub fn to_crop_config(&self) -> CropConfig {
        CropConfig {
            aspect: self.aspect_ratio.clone(),
            method: self.method,
            output_width: (self.output_width > 0).then_some(self.output_width),
            quality: Quality::new(self.quality),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crop.quality == 0 || self.crop.quality > 100 {
            return Err(ConfigError::Validation("crop.quality must be 1-100".into()));
        }
        if self.crop.output_width > MAX_OUTPUT_SIDE {
            return Err(ConfigError::Validation(format!(
                "crop.output_width must be at most {MAX_OUTPUT_SIDE}"
            )));
        }
        if self.crop.suffix.is_empty() {
            return Err(ConfigError::Validation(
                "crop.suffix must not be empty".into(),
            ));
        }
        if let Some(format) = &self.crop.format {
            if !OUTPUT_FORMATS.contains(&format.to_lowercase().as_str()) {
                return Err(ConfigError::Validation(format!(
                    "crop.format must be one of {}, got '{format}'",
                    OUTPUT_FORMATS.join(", ")
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicit config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `focal-crop.toml` from `dir`, or stock defaults if there is none.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `focal-crop.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# focal-crop Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Cropping
# ---------------------------------------------------------------------------
[crop]
# Target aspect ratio: "W:H", a decimal such as "1.5", or a preset:
# square, landscape-4-3, landscape-16-9, portrait-3-4, portrait-9-16, golden
aspect_ratio = "16:9"

# How the focal point is chosen:
#   auto              skin-tone detection, falling back to edge density
#   face              skin-tone detection only (center crop when none found)
#   edge              densest luminance edges
#   contrast          widest brightness range
#   center            no focal point, plain center crop
#   thirds:<quadrant> a rule-of-thirds intersection; quadrant is one of
#                     top-left, top-right, bottom-left, bottom-right
method = "auto"

# Output width in pixels. Height follows from the aspect ratio.
# 0 keeps the width of the crop window itself.
output_width = 800

# JPEG encoding quality (1 = worst, 100 = best). PNG and WebP are lossless.
quality = 90

# Appended to the input file stem: photo.jpg -> photo-crop.jpg
suffix = "crop"

# Output format: jpg, png or webp. Omit to keep each input's format.
# format = "webp"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
