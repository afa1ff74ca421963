//! Crop planning and image processing — pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode → RGBA** | `image` decoders + `into_rgba8` |
//! | **Focal point** | block heuristics in [`focal`] |
//! | **Crop window** | [`compute_center_crop`] / [`compute_focal_crop`] |
//! | **Crop → resample → encode** | `crop_imm` + Lanczos3 `resize_exact` + JPEG/PNG/WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Focal**: Pure focal point heuristics over borrowed pixel buffers
//! - **Parameters**: Data structures describing crop operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining the above with a backend

pub mod backend;
mod calculations;
pub mod focal;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    CropError, MAX_OUTPUT_SIDE, PixelRect, Rect, calculate_output_dimensions,
    compute_center_crop, compute_focal_crop,
};
pub use focal::{
    FocalMethod, FocalPoint, PixelView, Quadrant, Strategy, ThirdsPoint, estimate,
    estimate_with_strategy, rule_of_thirds_points,
};
pub use operations::{
    CropConfig, CropPlan, MethodOutcome, OperationError, SmartCropResult, center_crop,
    compare_methods, plan_crop, smart_crop,
};
pub use params::{ASPECT_PRESETS, AspectRatio, CropParams, Quality};
pub use rust_backend::RustBackend;
