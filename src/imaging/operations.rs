//! High-level crop operations.
//!
//! These functions combine calculations and focal estimation with backend
//! execution. They take configuration, compute parameters, and call the
//! backend. [`plan_crop`] is the pure part and does no I/O.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    CropError, Rect, calculate_output_dimensions, compute_center_crop, compute_focal_crop,
};
use super::focal::{FocalMethod, FocalPoint, PixelView, Strategy, estimate_with_strategy};
use super::params::{AspectRatio, CropParams, Quality};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{path}: {source}")]
    InvalidInput {
        path: String,
        #[source]
        source: CropError,
    },
}

/// Result type for crop operations.
pub type Result<T> = std::result::Result<T, OperationError>;

fn invalid(path: &Path) -> impl FnOnce(CropError) -> OperationError + '_ {
    move |source| OperationError::InvalidInput {
        path: path.display().to_string(),
        source,
    }
}

/// Configuration for a focal-point crop.
#[derive(Debug, Clone)]
pub struct CropConfig {
    pub aspect: AspectRatio,
    pub method: FocalMethod,
    /// Output width in pixels; `None` keeps the crop's own width.
    pub output_width: Option<u32>,
    pub quality: Quality,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::default(),
            method: FocalMethod::Auto,
            output_width: Some(800),
            quality: Quality::default(),
        }
    }
}

/// Everything decided about a crop before any pixels are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropPlan {
    pub crop: Rect,
    pub focal_point: Option<FocalPoint>,
    /// Strategy that produced `focal_point`, if any.
    pub strategy: Option<Strategy>,
    pub width: u32,
    pub height: u32,
}

/// Plan a crop over decoded pixels without executing it.
pub fn plan_crop(view: &PixelView, config: &CropConfig) -> std::result::Result<CropPlan, CropError> {
    let ratio = config.aspect.value();
    let found = estimate_with_strategy(view, config.method);
    let focal_point = found.map(|(_, point)| point);
    let crop = compute_focal_crop(view.width(), view.height(), ratio, focal_point)?;
    let (width, height) = calculate_output_dimensions(&crop, ratio, config.output_width)?;

    Ok(CropPlan {
        crop,
        focal_point,
        strategy: found.map(|(strategy, _)| strategy),
        width,
        height,
    })
}

/// Outcome of a smart crop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartCropResult {
    pub source: String,
    pub output: String,
    /// Method requested; see `plan.strategy` for the one that fired.
    pub method: FocalMethod,
    #[serde(flatten)]
    pub plan: CropPlan,
}

/// Estimate a focal point, crop around it, and render the result.
///
/// [`FocalMethod::Center`] needs no pixels and goes through [`center_crop`].
pub fn smart_crop(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &CropConfig,
) -> Result<SmartCropResult> {
    let plan = if config.method == FocalMethod::Center {
        center_crop(
            backend,
            source,
            output,
            &config.aspect,
            config.output_width,
            config.quality,
        )?
    } else {
        let pixels = backend.load_pixels(source)?;
        let view = PixelView::from_rgba(&pixels).map_err(invalid(source))?;
        let plan = plan_crop(&view, config).map_err(invalid(source))?;

        backend.render(&CropParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            crop: plan.crop.to_pixels(pixels.dimensions()),
            width: plan.width,
            height: plan.height,
            quality: config.quality,
        })?;
        plan
    };

    Ok(SmartCropResult {
        source: source.display().to_string(),
        output: output.display().to_string(),
        method: config.method,
        plan,
    })
}

/// Center-crop to `aspect` and render. Needs only the dimensions, not the pixels.
///
/// Output width defaults to the crop width when `output_width` is `None`.
pub fn center_crop(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    aspect: &AspectRatio,
    output_width: Option<u32>,
    quality: Quality,
) -> Result<CropPlan> {
    let dims = backend.identify(source)?;
    let ratio = aspect.value();
    let crop = compute_center_crop(dims.width, dims.height, ratio).map_err(invalid(source))?;
    let (width, height) =
        calculate_output_dimensions(&crop, ratio, output_width).map_err(invalid(source))?;

    backend.render(&CropParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        crop: crop.to_pixels((dims.width, dims.height)),
        width,
        height,
        quality,
    })?;

    Ok(CropPlan {
        crop,
        focal_point: None,
        strategy: None,
        width,
        height,
    })
}

/// Methods run side by side by [`compare_methods`].
pub const COMPARED_METHODS: [FocalMethod; 3] =
    [FocalMethod::Face, FocalMethod::Edge, FocalMethod::Contrast];

/// Focal point and crop window one method picks for an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodOutcome {
    pub method: FocalMethod,
    pub focal_point: Option<FocalPoint>,
    pub crop: Rect,
}

/// Run each of [`COMPARED_METHODS`] over one image. Decodes once, renders nothing.
pub fn compare_methods(
    backend: &impl ImageBackend,
    source: &Path,
    aspect: &AspectRatio,
) -> Result<Vec<MethodOutcome>> {
    let pixels = backend.load_pixels(source)?;
    let view = PixelView::from_rgba(&pixels).map_err(invalid(source))?;

    COMPARED_METHODS
        .iter()
        .map(|&method| -> Result<MethodOutcome> {
            let config = CropConfig {
                aspect: aspect.clone(),
                method,
                output_width: None,
                quality: Quality::default(),
            };
            let plan = plan_crop(&view, &config).map_err(invalid(source))?;
            Ok(MethodOutcome {
                method,
                focal_point: plan.focal_point,
                crop: plan.crop,
            })
        })
        .collect()
}
