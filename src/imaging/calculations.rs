//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Rectangles are in source-pixel coordinates as `f64`, exactly as a canvas
//! `drawImage` source rectangle would be; [`Rect::to_pixels`] snaps one to
//! whole pixels when a renderer needs integers.

use super::focal::FocalPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input-contract violations for the geometry and estimator entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
    #[error("aspect ratio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f64),
    #[error("pixel buffer holds {actual} bytes, expected {expected} for RGBA {width}x{height}")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("output {width}x{height} exceeds the {max}px limit per side")]
    OutputTooLarge { width: u64, height: u64, max: u32 },
}

/// Largest output width or height a crop may be rendered at.
pub const MAX_OUTPUT_SIDE: u32 = 65_535;

/// A crop window inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A crop window snapped to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Round to whole pixels, keeping the window inside `source`.
    ///
    /// Width and height are at least 1 so the renderer never receives an
    /// empty region.
    pub fn to_pixels(&self, source: (u32, u32)) -> PixelRect {
        let (src_w, src_h) = source;
        let width = (self.width.round() as u32).clamp(1, src_w.max(1));
        let height = (self.height.round() as u32).clamp(1, src_h.max(1));
        let x = (self.x.round() as u32).min(src_w.saturating_sub(width));
        let y = (self.y.round() as u32).min(src_h.saturating_sub(height));
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

fn check_inputs(source_width: u32, source_height: u32, target_ratio: f64) -> Result<(), CropError> {
    if source_width == 0 || source_height == 0 {
        return Err(CropError::ZeroDimensions {
            width: source_width,
            height: source_height,
        });
    }
    if !target_ratio.is_finite() || target_ratio <= 0.0 {
        return Err(CropError::InvalidAspectRatio(target_ratio));
    }
    Ok(())
}

/// Largest window of `target_ratio` that fits the source.
fn crop_size(source_width: f64, source_height: f64, target_ratio: f64) -> (f64, f64) {
    let source_ratio = source_width / source_height;
    let (width, height) = if source_ratio > target_ratio {
        // Source is wider: keep full height, trim the sides
        (source_height * target_ratio, source_height)
    } else {
        // Source is taller or equal: keep full width, trim top and bottom
        (source_width, source_width / target_ratio)
    };
    // Equal ratios can round one ulp past the source edge
    (width.min(source_width), height.min(source_height))
}

/// Calculate a crop window of `target_ratio` centered on the source.
///
/// # Examples
/// ```
/// # use focal_crop::imaging::compute_center_crop;
/// let rect = compute_center_crop(1920, 1080, 4.0 / 3.0).unwrap();
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (240.0, 0.0, 1440.0, 1080.0));
/// ```
pub fn compute_center_crop(
    source_width: u32,
    source_height: u32,
    target_ratio: f64,
) -> Result<Rect, CropError> {
    check_inputs(source_width, source_height, target_ratio)?;

    let (src_w, src_h) = (source_width as f64, source_height as f64);
    let (width, height) = crop_size(src_w, src_h, target_ratio);

    Ok(Rect {
        x: (src_w - width) / 2.0,
        y: (src_h - height) / 2.0,
        width,
        height,
    })
}

/// Calculate a crop window of `target_ratio` centered on `focal`, clamped to
/// the source bounds.
///
/// Near an edge the window slides inward rather than leaving the image, so
/// the focal point is then no longer exactly centered. Without a focal point
/// this is [`compute_center_crop`].
pub fn compute_focal_crop(
    source_width: u32,
    source_height: u32,
    target_ratio: f64,
    focal: Option<FocalPoint>,
) -> Result<Rect, CropError> {
    let Some(focal) = focal else {
        return compute_center_crop(source_width, source_height, target_ratio);
    };
    check_inputs(source_width, source_height, target_ratio)?;

    let (src_w, src_h) = (source_width as f64, source_height as f64);
    let (width, height) = crop_size(src_w, src_h, target_ratio);

    // max(0, min(limit, v)) rather than f64::clamp: limit can be a hair
    // below zero after float rounding and clamp panics when min > max.
    let x = (focal.x - width / 2.0).min(src_w - width).max(0.0);
    let y = (focal.y - height / 2.0).min(src_h - height).max(0.0);

    Ok(Rect {
        x,
        y,
        width,
        height,
    })
}

/// Calculate final output dimensions for a crop.
///
/// Width is `output_width` when given, otherwise the crop's own width; the
/// height follows from `target_ratio`. Both are at least 1 and at most
/// [`MAX_OUTPUT_SIDE`].
pub fn calculate_output_dimensions(
    crop: &Rect,
    target_ratio: f64,
    output_width: Option<u32>,
) -> Result<(u32, u32), CropError> {
    let width = output_width.unwrap_or_else(|| crop.width.round() as u32).max(1);
    let height = (width as f64 / target_ratio).round().max(1.0);
    if width > MAX_OUTPUT_SIDE || height > MAX_OUTPUT_SIDE as f64 {
        return Err(CropError::OutputTooLarge {
            width: width as u64,
            height: height as u64,
            max: MAX_OUTPUT_SIDE,
        });
    }
    Ok((width, height as u32))
}
