//! Focal point estimation over RGBA pixel buffers.
//!
//! Every heuristic shares one scan pattern: the image is cut into square,
//! non-overlapping blocks read left-to-right, top-to-bottom. A block is only
//! visited while `origin + size < dimension`, so the last partial row and
//! column are dropped rather than padded. Each block is scored and reported
//! at its center.
//!
//! | Strategy | Block | Score | Winner |
//! |---|---|---|---|
//! | Skin tone | 20 px | skin pixel ratio (> 0.30 to qualify) | largest skin pixel count |
//! | Edge density | 32 px | sum of luminance steps to right/below neighbours | highest score |
//! | Contrast | 40 px | max − min luminance | highest score |
//! | Rule of thirds | — | fixed intersections | chosen by the caller |
//!
//! Ties always go to the block seen first in scan order.
//!
//! A [`FocalMethod`] resolves to an ordered chain of [`Strategy`] values and
//! the first strategy that yields a point wins. `auto` is skin tone then edge
//! density: a detected subject beats a generic salient region, and the
//! fallback fires only when no block qualifies as skin, never on a low score.

use super::calculations::CropError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EDGE_BLOCK: u32 = 32;
const SKIN_BLOCK: u32 = 20;
const CONTRAST_BLOCK: u32 = 40;

/// Minimum share of skin pixels for a block to count as a face candidate.
const SKIN_RATIO_THRESHOLD: f64 = 0.3;

/// Borrowed, validated view of an RGBA8 image.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> PixelView<'a> {
    /// Wrap a tightly packed RGBA buffer of `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self, CropError> {
        if width == 0 || height == 0 {
            return Err(CropError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CropError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// View an [`image::RgbaImage`] without copying.
    pub fn from_rgba(img: &'a image::RgbaImage) -> Result<Self, CropError> {
        Self::new(img.width(), img.height(), img.as_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }

    /// Mean of the R, G and B channels.
    #[inline]
    fn luminance(&self, x: u32, y: u32) -> f64 {
        let (r, g, b) = self.rgb(x, y);
        (r as f64 + g as f64 + b as f64) / 3.0
    }

    /// Origins of every whole block of `size`, in scan order.
    fn blocks(&self, size: u32) -> impl Iterator<Item = (u32, u32)> + use<> {
        let (width, height) = (self.width, self.height);
        (0..)
            .map(move |row| row * size)
            .take_while(move |&y| y + size < height)
            .flat_map(move |y| {
                (0..)
                    .map(move |col| col * size)
                    .take_while(move |&x| x + size < width)
                    .map(move |x| (x, y))
            })
    }
}

/// A point judged visually important, in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

/// Score of one scan block, reported at the block center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockScore {
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl From<BlockScore> for FocalPoint {
    fn from(block: BlockScore) -> Self {
        Self {
            x: block.x,
            y: block.y,
            score: block.score,
        }
    }
}

fn block_center(origin: u32, size: u32) -> f64 {
    origin as f64 + size as f64 / 2.0
}

/// First block with the strictly highest score.
fn highest(scores: Vec<BlockScore>) -> Option<BlockScore> {
    scores
        .into_iter()
        .reduce(|best, current| if current.score > best.score { current } else { best })
}

/// Classify one pixel as skin tone.
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    r > 95 && g > 40 && b > 20 && r > g && r > b && (r - g).abs() > 15 && r - b > 15
}

/// Block with the highest density of luminance edges.
///
/// Returns `None` only when the image is too small to hold a single block.
pub fn edge_density_focal_point(view: &PixelView) -> Option<FocalPoint> {
    let scores: Vec<BlockScore> = view
        .blocks(EDGE_BLOCK)
        .map(|(x, y)| {
            let mut score = 0.0;
            for dy in 0..EDGE_BLOCK - 1 {
                for dx in 0..EDGE_BLOCK - 1 {
                    let current = view.luminance(x + dx, y + dy);
                    let right = view.luminance(x + dx + 1, y + dy);
                    let below = view.luminance(x + dx, y + dy + 1);
                    score += (current - right).abs() + (current - below).abs();
                }
            }
            BlockScore {
                x: block_center(x, EDGE_BLOCK),
                y: block_center(y, EDGE_BLOCK),
                score,
            }
        })
        .collect();

    highest(scores).map(FocalPoint::from)
}

/// Center of the block with the most skin-tone pixels.
///
/// Only blocks whose skin ratio exceeds 30% are candidates; among those the
/// absolute skin count decides. The returned score is the winner's ratio.
pub fn skin_tone_focal_point(view: &PixelView) -> Option<FocalPoint> {
    let total = (SKIN_BLOCK * SKIN_BLOCK) as f64;

    view.blocks(SKIN_BLOCK)
        .filter_map(|(x, y)| {
            let mut skin = 0u32;
            for dy in 0..SKIN_BLOCK {
                for dx in 0..SKIN_BLOCK {
                    let (r, g, b) = view.rgb(x + dx, y + dy);
                    if is_skin_tone(r, g, b) {
                        skin += 1;
                    }
                }
            }
            let ratio = skin as f64 / total;
            (ratio > SKIN_RATIO_THRESHOLD).then(|| {
                (
                    skin,
                    FocalPoint {
                        x: block_center(x, SKIN_BLOCK),
                        y: block_center(y, SKIN_BLOCK),
                        score: ratio,
                    },
                )
            })
        })
        .reduce(|best, current| if current.0 > best.0 { current } else { best })
        .map(|(_, point)| point)
}

/// Block with the widest luminance range.
pub fn contrast_focal_point(view: &PixelView) -> Option<FocalPoint> {
    let scores: Vec<BlockScore> = view
        .blocks(CONTRAST_BLOCK)
        .map(|(x, y)| {
            let mut min = 255.0f64;
            let mut max = 0.0f64;
            for dy in 0..CONTRAST_BLOCK {
                for dx in 0..CONTRAST_BLOCK {
                    let lum = view.luminance(x + dx, y + dy);
                    min = min.min(lum);
                    max = max.max(lum);
                }
            }
            BlockScore {
                x: block_center(x, CONTRAST_BLOCK),
                y: block_center(y, CONTRAST_BLOCK),
                score: max - min,
            }
        })
        .collect();

    highest(scores).map(FocalPoint::from)
}

/// One of the four rule-of-thirds intersections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top-left",
            Quadrant::TopRight => "top-right",
            Quadrant::BottomLeft => "bottom-left",
            Quadrant::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quadrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quadrant::ALL
            .into_iter()
            .find(|q| q.name() == s)
            .ok_or_else(|| {
                format!("unknown quadrant '{s}' (expected top-left, top-right, bottom-left or bottom-right)")
            })
    }
}

/// A rule-of-thirds intersection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThirdsPoint {
    pub x: f64,
    pub y: f64,
    pub quadrant: Quadrant,
}

/// The four rule-of-thirds intersections, in [`Quadrant::ALL`] order.
pub fn rule_of_thirds_points(width: u32, height: u32) -> [ThirdsPoint; 4] {
    let (w, h) = (width as f64, height as f64);
    Quadrant::ALL.map(|quadrant| {
        let (fx, fy) = match quadrant {
            Quadrant::TopLeft => (1.0, 1.0),
            Quadrant::TopRight => (2.0, 1.0),
            Quadrant::BottomLeft => (1.0, 2.0),
            Quadrant::BottomRight => (2.0, 2.0),
        };
        ThirdsPoint {
            x: fx * w / 3.0,
            y: fy * h / 3.0,
            quadrant,
        }
    })
}

/// A single focal point heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    SkinTone,
    EdgeDensity,
    Contrast,
    Thirds(Quadrant),
}

impl Strategy {
    /// Run this heuristic over `view`.
    pub fn locate(self, view: &PixelView) -> Option<FocalPoint> {
        match self {
            Strategy::SkinTone => skin_tone_focal_point(view),
            Strategy::EdgeDensity => edge_density_focal_point(view),
            Strategy::Contrast => contrast_focal_point(view),
            Strategy::Thirds(quadrant) => rule_of_thirds_points(view.width, view.height)
                .into_iter()
                .find(|p| p.quadrant == quadrant)
                .map(|p| FocalPoint {
                    x: p.x,
                    y: p.y,
                    score: 0.0,
                }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SkinTone => f.write_str("skin-tone"),
            Strategy::EdgeDensity => f.write_str("edge-density"),
            Strategy::Contrast => f.write_str("contrast"),
            Strategy::Thirds(q) => write!(f, "thirds:{q}"),
        }
    }
}

/// How to choose the focal point for a crop.
///
/// Parses from and prints as `auto`, `face`, `edge`, `contrast`, `center`,
/// or `thirds:<quadrant>` (plain `thirds` means `thirds:top-left`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FocalMethod {
    /// Skin tone, falling back to edge density.
    #[default]
    Auto,
    Face,
    Edge,
    Contrast,
    Thirds(Quadrant),
    /// No focal point: plain center crop.
    Center,
}

impl FocalMethod {
    /// Strategies to try, in order. The first to yield a point wins.
    pub fn strategies(self) -> Vec<Strategy> {
        match self {
            FocalMethod::Auto => vec![Strategy::SkinTone, Strategy::EdgeDensity],
            FocalMethod::Face => vec![Strategy::SkinTone],
            FocalMethod::Edge => vec![Strategy::EdgeDensity],
            FocalMethod::Contrast => vec![Strategy::Contrast],
            FocalMethod::Thirds(quadrant) => vec![Strategy::Thirds(quadrant)],
            FocalMethod::Center => Vec::new(),
        }
    }
}

impl fmt::Display for FocalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocalMethod::Auto => f.write_str("auto"),
            FocalMethod::Face => f.write_str("face"),
            FocalMethod::Edge => f.write_str("edge"),
            FocalMethod::Contrast => f.write_str("contrast"),
            FocalMethod::Thirds(q) => write!(f, "thirds:{q}"),
            FocalMethod::Center => f.write_str("center"),
        }
    }
}

impl FromStr for FocalMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(FocalMethod::Auto),
            "face" => Ok(FocalMethod::Face),
            "edge" => Ok(FocalMethod::Edge),
            "contrast" => Ok(FocalMethod::Contrast),
            "center" => Ok(FocalMethod::Center),
            "thirds" => Ok(FocalMethod::Thirds(Quadrant::TopLeft)),
            other => match other.strip_prefix("thirds:") {
                Some(quadrant) => quadrant.parse().map(FocalMethod::Thirds),
                None => Err(format!(
                    "unknown focal method '{other}' (expected auto, face, edge, contrast, center or thirds:<quadrant>)"
                )),
            },
        }
    }
}

impl TryFrom<String> for FocalMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FocalMethod> for String {
    fn from(method: FocalMethod) -> Self {
        method.to_string()
    }
}

/// Estimate a focal point, reporting which strategy produced it.
pub fn estimate_with_strategy(
    view: &PixelView,
    method: FocalMethod,
) -> Option<(Strategy, FocalPoint)> {
    let found = method
        .strategies()
        .into_iter()
        .find_map(|strategy| match strategy.locate(view) {
            Some(point) => Some((strategy, point)),
            None => {
                debug!("{strategy} found no focal point in {}x{}", view.width, view.height);
                None
            }
        });

    match &found {
        Some((strategy, point)) => debug!(
            "{method}: {strategy} picked ({:.1}, {:.1}) score {:.3}",
            point.x, point.y, point.score
        ),
        None => debug!("{method}: no focal point, center crop"),
    }
    found
}

/// Estimate a focal point with `method`, or `None` when no strategy applies.
pub fn estimate(view: &PixelView, method: FocalMethod) -> Option<FocalPoint> {
    estimate_with_strategy(view, method).map(|(_, point)| point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const SKIN: Rgba<u8> = Rgba([200, 150, 100, 255]);
    const GREY: Rgba<u8> = Rgba([90, 90, 90, 255]);

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, color)
    }

    /// Paint `[x0, x1) × [y0, y1)` with `color`.
    fn paint(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, color);
            }
        }
    }

    /// Black/white checkerboard confined to one rectangle on a grey field.
    fn checker_patch(width: u32, height: u32, x0: u32, y0: u32, size: u32) -> RgbaImage {
        let mut img = solid(width, height, GREY);
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                let v = if (x + y) % 2 == 0 { 0 } else { 255 };
                img.put_pixel(x, y, Rgba([v, v, v, 255]));
            }
        }
        img
    }

    // =========================================================================
    // PixelView tests
    // =========================================================================

    #[test]
    fn view_rejects_wrong_length() {
        let buf = vec![0u8; 10];
        assert_eq!(
            PixelView::new(2, 2, &buf).unwrap_err(),
            CropError::BufferSizeMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 10
            }
        );
    }

    #[test]
    fn view_rejects_zero_dimensions() {
        assert!(PixelView::new(0, 5, &[]).is_err());
    }

    #[test]
    fn blocks_drop_final_partial_row_and_column() {
        let buf = vec![0u8; 70 * 45 * 4];
        let view = PixelView::new(70, 45, &buf).unwrap();
        let origins: Vec<_> = view.blocks(20).collect();
        // x: 0, 20, 40 (60 + 20 >= 70); y: 0, 20 (40 + 20 >= 45)
        assert_eq!(
            origins,
            vec![(0, 0), (20, 0), (40, 0), (0, 20), (20, 20), (40, 20)]
        );
    }

    #[test]
    fn blocks_skip_exact_fit() {
        // A block ending exactly on the edge is still dropped
        let buf = vec![0u8; 64 * 64 * 4];
        let view = PixelView::new(64, 64, &buf).unwrap();
        assert_eq!(view.blocks(32).collect::<Vec<_>>(), vec![(0, 0)]);
    }

    // =========================================================================
    // Skin tone tests
    // =========================================================================

    #[test]
    fn skin_tone_classifier() {
        assert!(is_skin_tone(200, 150, 100));
        assert!(!is_skin_tone(50, 50, 200));
        // Each rule on its own
        assert!(!is_skin_tone(95, 50, 30)); // R too low
        assert!(!is_skin_tone(200, 40, 30)); // G too low
        assert!(!is_skin_tone(200, 150, 20)); // B too low
        assert!(!is_skin_tone(150, 140, 100)); // |R-G| too small
        assert!(!is_skin_tone(120, 60, 110)); // R-B too small
        assert!(!is_skin_tone(150, 160, 100)); // G above R
    }

    #[test]
    fn skin_tone_none_without_skin() {
        let img = solid(200, 200, GREY);
        let view = PixelView::from_rgba(&img).unwrap();
        assert_eq!(skin_tone_focal_point(&view), None);
    }

    #[test]
    fn skin_tone_needs_more_than_thirty_percent() {
        // Exactly 120 of 400 pixels (30%) is not enough
        let mut img = solid(100, 100, GREY);
        paint(&mut img, 20, 20, 40, 26, SKIN);
        let view = PixelView::from_rgba(&img).unwrap();
        assert_eq!(skin_tone_focal_point(&view), None);

        // 140 of 400 (35%) qualifies
        paint(&mut img, 20, 26, 40, 27, SKIN);
        let point = skin_tone_focal_point(&view_of(&img)).unwrap();
        assert_eq!((point.x, point.y), (30.0, 30.0));
        assert!((point.score - 0.35).abs() < 1e-12);
    }

    fn view_of(img: &RgbaImage) -> PixelView<'_> {
        PixelView::from_rgba(img).unwrap()
    }

    #[test]
    fn skin_tone_prefers_larger_count_over_first_seen() {
        let mut img = solid(200, 200, GREY);
        // Block (0,0): 50% skin
        paint(&mut img, 0, 0, 20, 10, SKIN);
        // Block (100,100): fully skin
        paint(&mut img, 100, 100, 120, 120, SKIN);
        let point = skin_tone_focal_point(&view_of(&img)).unwrap();
        assert_eq!((point.x, point.y), (110.0, 110.0));
        assert_eq!(point.score, 1.0);
    }

    #[test]
    fn skin_tone_tie_goes_to_first_block() {
        let mut img = solid(200, 200, GREY);
        paint(&mut img, 60, 40, 80, 60, SKIN);
        paint(&mut img, 20, 120, 40, 140, SKIN);
        let point = skin_tone_focal_point(&view_of(&img)).unwrap();
        assert_eq!((point.x, point.y), (70.0, 50.0));
    }

    // =========================================================================
    // Edge density tests
    // =========================================================================

    #[test]
    fn edge_density_finds_textured_block() {
        let img = checker_patch(256, 192, 128, 64, 32);
        let point = edge_density_focal_point(&view_of(&img)).unwrap();
        assert_eq!((point.x, point.y), (144.0, 80.0));
        // 31x31 inner pixels, each with two 255 steps
        assert_eq!(point.score, 31.0 * 31.0 * 2.0 * 255.0);
    }

    #[test]
    fn edge_density_flat_image_returns_first_block() {
        let img = solid(100, 100, GREY);
        let point = edge_density_focal_point(&view_of(&img)).unwrap();
        assert_eq!((point.x, point.y, point.score), (16.0, 16.0, 0.0));
    }

    #[test]
    fn edge_density_none_when_too_small() {
        let img = solid(32, 200, GREY);
        assert_eq!(edge_density_focal_point(&view_of(&img)), None);
    }

    // =========================================================================
    // Contrast tests
    // =========================================================================

    #[test]
    fn contrast_finds_widest_range() {
        let mut img = solid(200, 200, GREY);
        img.put_pixel(85, 125, Rgba([0, 0, 0, 255]));
        img.put_pixel(90, 130, Rgba([255, 255, 255, 255]));
        let point = contrast_focal_point(&view_of(&img)).unwrap();
        // Both pixels land in block (80, 120)
        assert_eq!((point.x, point.y), (100.0, 140.0));
        assert_eq!(point.score, 255.0);
    }

    #[test]
    fn contrast_tie_goes_to_first_block() {
        let img = solid(200, 200, GREY);
        let point = contrast_focal_point(&view_of(&img)).unwrap();
        assert_eq!((point.x, point.y, point.score), (20.0, 20.0, 0.0));
    }

    // =========================================================================
    // Rule of thirds tests
    // =========================================================================

    #[test]
    fn thirds_points_for_900_by_600() {
        let points = rule_of_thirds_points(900, 600);
        let coords: Vec<_> = points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            coords,
            vec![(300.0, 200.0), (600.0, 200.0), (300.0, 400.0), (600.0, 400.0)]
        );
        let names: Vec<_> = points.iter().map(|p| p.quadrant.name()).collect();
        assert_eq!(names, vec!["top-left", "top-right", "bottom-left", "bottom-right"]);
    }

    #[test]
    fn thirds_strategy_returns_chosen_quadrant() {
        let img = solid(900, 600, GREY);
        let point = Strategy::Thirds(Quadrant::BottomRight)
            .locate(&view_of(&img))
            .unwrap();
        assert_eq!((point.x, point.y), (600.0, 400.0));
    }

    // =========================================================================
    // Composite selection tests
    // =========================================================================

    #[test]
    fn auto_without_skin_matches_edge_density() {
        let img = checker_patch(320, 240, 64, 160, 40);
        let view = view_of(&img);
        let auto = estimate_with_strategy(&view, FocalMethod::Auto).unwrap();
        assert_eq!(auto.0, Strategy::EdgeDensity);
        assert_eq!(Some(auto.1), estimate(&view, FocalMethod::Edge));
    }

    #[test]
    fn auto_prefers_skin_over_stronger_edges() {
        // Strong texture at top-left, a small skin patch at bottom-right
        let mut img = checker_patch(320, 240, 0, 0, 64);
        paint(&mut img, 260, 180, 280, 200, SKIN);
        let view = view_of(&img);
        let (strategy, point) = estimate_with_strategy(&view, FocalMethod::Auto).unwrap();
        assert_eq!(strategy, Strategy::SkinTone);
        assert_eq!((point.x, point.y), (270.0, 190.0));
    }

    #[test]
    fn face_method_has_no_fallback() {
        let img = checker_patch(320, 240, 64, 64, 40);
        assert_eq!(estimate(&view_of(&img), FocalMethod::Face), None);
    }

    #[test]
    fn center_method_yields_nothing() {
        let img = checker_patch(320, 240, 64, 64, 40);
        assert_eq!(estimate(&view_of(&img), FocalMethod::Center), None);
    }

    #[test]
    fn method_parses_and_prints() {
        for text in ["auto", "face", "edge", "contrast", "center", "thirds:bottom-left"] {
            let method: FocalMethod = text.parse().unwrap();
            assert_eq!(method.to_string(), text);
        }
        assert_eq!(
            "thirds".parse::<FocalMethod>().unwrap(),
            FocalMethod::Thirds(Quadrant::TopLeft)
        );
        assert!("smart".parse::<FocalMethod>().is_err());
        assert!("thirds:middle".parse::<FocalMethod>().is_err());
    }
}
