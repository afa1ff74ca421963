//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the boundary between crop planning and pixel
//! work. It plays both external collaborators of the crop pipeline:
//!
//! | Role | Method |
//! |---|---|
//! | Image source provider | [`ImageBackend::identify`], [`ImageBackend::load_pixels`] |
//! | Output renderer | [`ImageBackend::render`] |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::CropParams;
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement all three operations so the rest of the
/// codebase is backend-agnostic.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image into a tightly packed RGBA8 buffer.
    fn load_pixels(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Crop, resample, and encode as described by `params`.
    fn render(&self, params: &CropParams) -> Result<(), BackendError>;
}
