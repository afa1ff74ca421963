//! Parameter types for crop operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides where to crop) and the [`backend`](super::backend) (which
//! does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`AspectRatio`] — Positive width/height ratio, parsed from `16:9`, `1.5`, or a named preset.
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropParams`] — Full specification for a render: source, output, pixel crop window, output size, quality.

use super::calculations::{CropError, PixelRect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Named aspect ratios commonly used for editorial crops.
pub const ASPECT_PRESETS: &[(&str, f64)] = &[
    ("square", 1.0),
    ("landscape-4-3", 4.0 / 3.0),
    ("landscape-16-9", 16.0 / 9.0),
    ("portrait-3-4", 3.0 / 4.0),
    ("portrait-9-16", 9.0 / 16.0),
    ("golden", 1.618),
];

/// Target width/height ratio of a crop. Always positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    value: f64,
    label: String,
}

impl AspectRatio {
    pub fn new(value: f64) -> Result<Self, CropError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CropError::InvalidAspectRatio(value));
        }
        Ok(Self {
            value,
            label: value.to_string(),
        })
    }

    /// Ratio of `width:height`, e.g. `AspectRatio::from_parts(16, 9)`.
    pub fn from_parts(width: u32, height: u32) -> Result<Self, CropError> {
        if width == 0 || height == 0 {
            return Err(CropError::InvalidAspectRatio(width as f64 / height as f64));
        }
        Ok(Self {
            value: width as f64 / height as f64,
            label: format!("{width}:{height}"),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self {
            value: 16.0 / 9.0,
            label: "16:9".to_string(),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(&(name, value)) = ASPECT_PRESETS.iter().find(|(name, _)| *name == s) {
            return Ok(Self {
                value,
                label: name.to_string(),
            });
        }
        let parsed = match s.split_once(':') {
            Some((w, h)) => {
                let w: u32 = w.trim().parse().map_err(|_| invalid_ratio(s))?;
                let h: u32 = h.trim().parse().map_err(|_| invalid_ratio(s))?;
                Self::from_parts(w, h)
            }
            None => Self::new(s.parse().map_err(|_| invalid_ratio(s))?),
        };
        parsed.map_err(|e| e.to_string())
    }
}

fn invalid_ratio(s: &str) -> String {
    let names: Vec<&str> = ASPECT_PRESETS.iter().map(|(name, _)| *name).collect();
    format!(
        "invalid aspect ratio '{s}' (use W:H, a decimal, or one of {})",
        names.join(", ")
    )
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.label
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for one crop render: cut `crop` out of `source`, resample to
/// `width`x`height`, encode to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub crop: PixelRect,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn aspect_parses_width_height() {
        let ratio: AspectRatio = "4:3".parse().unwrap();
        assert_eq!(ratio.value(), 4.0 / 3.0);
        assert_eq!(ratio.to_string(), "4:3");
    }

    #[test]
    fn aspect_parses_decimal() {
        let ratio: AspectRatio = "1.5".parse().unwrap();
        assert_eq!(ratio.value(), 1.5);
    }

    #[test]
    fn aspect_parses_presets() {
        assert_eq!("square".parse::<AspectRatio>().unwrap().value(), 1.0);
        assert_eq!("golden".parse::<AspectRatio>().unwrap().value(), 1.618);
        assert_eq!(
            "portrait-9-16".parse::<AspectRatio>().unwrap().value(),
            9.0 / 16.0
        );
    }

    #[test]
    fn aspect_rejects_non_positive() {
        assert!("0:9".parse::<AspectRatio>().is_err());
        assert!("16:0".parse::<AspectRatio>().is_err());
        assert!("-1.5".parse::<AspectRatio>().is_err());
        assert!("wide".parse::<AspectRatio>().is_err());
        assert!(AspectRatio::new(f64::NAN).is_err());
    }

    #[test]
    fn aspect_default_is_sixteen_nine() {
        assert_eq!(AspectRatio::default().value(), 16.0 / 9.0);
    }
}
