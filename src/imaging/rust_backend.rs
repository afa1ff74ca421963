//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) → RGBA8 | `image::ImageReader` + `DynamicImage::into_rgba8` |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Resample | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality) |
//! | Encode → PNG, WebP | `image::DynamicImage::save_with_format` (lossless) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::CropParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has an extension this backend can decode.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let e = e.to_ascii_lowercase();
            supported_input_extensions().contains(&e.as_str())
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => save_jpeg(img, path, quality),
        "png" => save_lossless(img, path, ImageFormat::Png),
        "webp" => save_lossless(img, path, ImageFormat::WebP),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

/// Encode and save as JPEG. JPEG has no alpha channel, so flatten to RGB first.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

fn save_lossless(img: &DynamicImage, path: &Path, format: ImageFormat) -> Result<(), BackendError> {
    // The WebP encoder only takes 8-bit RGB/RGBA
    DynamicImage::ImageRgba8(img.to_rgba8())
        .save_with_format(path, format)
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("{:?} encode failed: {}", format, e))
        })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn load_pixels(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        Ok(load_image(path)?.into_rgba8())
    }

    fn render(&self, params: &CropParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let crop = params.crop;
        if crop.x + crop.width > img.width() || crop.y + crop.height > img.height() {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop {}x{}+{}+{} exceeds {}x{} source {}",
                crop.width,
                crop.height,
                crop.x,
                crop.y,
                img.width(),
                img.height(),
                params.source.display()
            )));
        }

        let cropped = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
        let resized = if (crop.width, crop.height) == (params.width, params.height) {
            cropped
        } else {
            cropped.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        save_image(&resized, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::PixelRect;
    use crate::imaging::params::Quality;
    use image::{ImageEncoder, RgbImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn supported_input_ignores_case() {
        assert!(is_supported_input(Path::new("/a/photo.JPG")));
        assert!(is_supported_input(Path::new("scan.tiff")));
        assert!(!is_supported_input(Path::new("notes.txt")));
        assert!(!is_supported_input(Path::new("no-extension")));
    }

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn crop_params(source: &Path, output: &Path, crop: PixelRect, w: u32, h: u32) -> CropParams {
        CropParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            crop,
            width: w,
            height: h,
            quality: Quality::new(85),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn load_pixels_returns_rgba_buffer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 64, 48);

        let pixels = RustBackend::new().load_pixels(&path).unwrap();
        assert_eq!(pixels.dimensions(), (64, 48));
        assert_eq!(pixels.as_raw().len(), 64 * 48 * 4);
    }

    #[test]
    fn load_pixels_rejects_garbage() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(RustBackend::new().load_pixels(&path).is_err());
    }

    #[test]
    fn render_crop_to_jpeg_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("crop.jpg");
        let crop = PixelRect {
            x: 50,
            y: 0,
            width: 300,
            height: 300,
        };
        RustBackend::new()
            .render(&crop_params(&source, &output, crop, 120, 120))
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (120, 120));
    }

    #[test]
    fn render_crop_to_png_and_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 160, 90);
        let crop = PixelRect {
            x: 0,
            y: 0,
            width: 160,
            height: 90,
        };

        for name in ["crop.png", "crop.webp"] {
            let output = tmp.path().join(name);
            RustBackend::new()
                .render(&crop_params(&source, &output, crop, 80, 45))
                .unwrap();
            assert_eq!(image::image_dimensions(&output).unwrap(), (80, 45));
        }
    }

    #[test]
    fn render_out_of_bounds_crop_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100);

        let crop = PixelRect {
            x: 50,
            y: 0,
            width: 100,
            height: 100,
        };
        let result = RustBackend::new().render(&crop_params(
            &source,
            &tmp.path().join("out.jpg"),
            crop,
            10,
            10,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn render_unsupported_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100);

        let crop = PixelRect {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        };
        let result = RustBackend::new().render(&crop_params(
            &source,
            &tmp.path().join("out.gif"),
            crop,
            50,
            50,
        ));
        assert!(result.is_err());
    }
}
