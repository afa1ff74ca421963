//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each image leads with its positional index and file name. Details such
//! as the strategy that fired, the crop window, or an error follow as
//! indented context lines, so a batch reads as an inventory of what happened
//! to each file.
//!
//! # Output Format
//!
//! ## Crop
//!
//! ```text
//! 001 dawn.jpg → out/dawn-crop.jpg
//!     Focus: skin-tone
//!     Size: 800x450
//! 002 broken.jpg
//!     Error: Processing failed: Failed to decode ...
//!
//! Cropped 1 image, 1 failed
//! ```
//!
//! ## Focus
//!
//! ```text
//! portrait.jpg (1200x1600)
//!     Method: auto
//!     Focus: (610, 410) via skin-tone, score 0.82
//! ```
//!
//! ## Compare
//!
//! ```text
//! portrait.jpg
//!     face      (610, 410)  crop 0,185 1200x675
//!     edge      (592, 912)  crop 0,575 1200x675
//!     contrast  (580, 940)  crop 0,602 1200x675
//! ```
//!
//! ## Thirds
//!
//! ```text
//! 900x600
//!     top-left      (300, 200)
//!     top-right     (600, 200)
//!     bottom-left   (300, 400)
//!     bottom-right  (600, 400)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{FocalMethod, FocalPoint, MethodOutcome, Rect, Strategy, ThirdsPoint};
use crate::process::{BatchResult, CropEvent};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// File name of a path string, or the whole string if it has none.
fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// `(x, y)` rounded to whole pixels.
fn point(x: f64, y: f64) -> String {
    format!("({:.0}, {:.0})", x, y)
}

/// `x,y WxH` rounded to whole pixels.
fn window(rect: &Rect) -> String {
    format!(
        "{:.0},{:.0} {:.0}x{:.0}",
        rect.x, rect.y, rect.width, rect.height
    )
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Crop
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_crop_event(event: &CropEvent) -> Vec<String> {
    match event {
        CropEvent::Cropped {
            index,
            source,
            output,
            strategy,
            width,
            height,
        } => {
            let focus = match strategy {
                Some(s) => s.to_string(),
                None => "center".to_string(),
            };
            vec![
                format!("{} {} \u{2192} {}", format_index(*index), file_name(source), output),
                format!("    Focus: {}", focus),
                format!("    Size: {}x{}", width, height),
            ]
        }
        CropEvent::Failed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("    Error: {}", error),
        ],
    }
}

/// Format the closing summary of a batch.
pub fn format_batch_summary(result: &BatchResult) -> Vec<String> {
    let mut line = format!("Cropped {}", plural(result.succeeded(), "image"));
    if result.failed() > 0 {
        line.push_str(&format!(", {} failed", result.failed()));
    }
    vec![String::new(), line]
}

/// Print batch summary to stdout.
pub fn print_batch_summary(result: &BatchResult) {
    print_lines(format_batch_summary(result));
}

// ============================================================================
// Focus
// ============================================================================

/// Format the focal point found for one image.
pub fn format_focus(
    source: &str,
    (width, height): (u32, u32),
    method: FocalMethod,
    found: Option<(Strategy, FocalPoint)>,
) -> Vec<String> {
    let focus = match found {
        Some((strategy, p)) => format!(
            "    Focus: {} via {}, score {:.2}",
            point(p.x, p.y),
            strategy,
            p.score
        ),
        None => "    Focus: none (center crop)".to_string(),
    };
    vec![
        format!("{} ({}x{})", file_name(source), width, height),
        format!("    Method: {}", method),
        focus,
    ]
}

/// Print focus output to stdout.
pub fn print_focus(
    source: &str,
    dimensions: (u32, u32),
    method: FocalMethod,
    found: Option<(Strategy, FocalPoint)>,
) {
    print_lines(format_focus(source, dimensions, method, found));
}

// ============================================================================
// Compare
// ============================================================================

/// Format one row per compared method.
pub fn format_compare(source: &str, outcomes: &[MethodOutcome]) -> Vec<String> {
    let mut lines = vec![file_name(source)];
    for outcome in outcomes {
        let focus = match &outcome.focal_point {
            Some(p) => point(p.x, p.y),
            None => "none".to_string(),
        };
        lines.push(format!(
            "    {:<9} {:<11} crop {}",
            outcome.method.to_string(),
            focus,
            window(&outcome.crop)
        ));
    }
    lines
}

/// Print compare output to stdout.
pub fn print_compare(source: &str, outcomes: &[MethodOutcome]) {
    print_lines(format_compare(source, outcomes));
}

// ============================================================================
// Thirds
// ============================================================================

/// Format the four rule-of-thirds intersections.
pub fn format_thirds((width, height): (u32, u32), points: &[ThirdsPoint]) -> Vec<String> {
    let mut lines = vec![format!("{}x{}", width, height)];
    for p in points {
        lines.push(format!(
            "    {:<13} {}",
            p.quadrant.to_string(),
            point(p.x, p.y)
        ));
    }
    lines
}

/// Print thirds output to stdout.
pub fn print_thirds(dimensions: (u32, u32), points: &[ThirdsPoint]) {
    print_lines(format_thirds(dimensions, points));
}
