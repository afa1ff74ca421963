//! # Focal Crop
//!
//! Crops photos to a target aspect ratio around their most interesting point.
//! Editorial pipelines need the same photo as a square avatar, a 16:9 hero,
//! and a 3:4 card; a plain center crop cuts off faces and subjects that sit
//! off-center. Focal Crop picks a focal point with cheap block heuristics and
//! slides the crop window toward it.
//!
//! # Architecture: Plan, Then Render
//!
//! ```text
//! pixels ─▶ focal point estimator ─▶ geometry engine ─▶ crop rectangle ─▶ renderer
//!           (imaging::focal)          (imaging::calculations)             (ImageBackend)
//! ```
//!
//! Planning is pure: it reads a borrowed RGBA buffer and returns a
//! floating-point rectangle. Decoding, resampling, and encoding live behind
//! the [`imaging::ImageBackend`] trait, so the planning logic is unit tested
//! against synthetic buffers and a recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Crop geometry, focal heuristics, crop parameters, and the `image`-crate backend |
//! | [`process`] | Batch cropping of files and directories in parallel with rayon |
//! | [`config`] | `focal-crop.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Largest Window, Then Clamp
//!
//! The crop window is always the largest rectangle of the target ratio that
//! fits the source: full height for sources wider than the target, full width
//! otherwise. A focal point only moves the window, never shrinks it. The
//! window is centered on the point and clamped into the image, so a point near
//! an edge yields a window flush with that edge rather than one hanging off it.
//!
//! ## Ordered Heuristic Chains
//!
//! Each [`imaging::FocalMethod`] expands to an ordered list of
//! [`imaging::Strategy`] values. The first strategy to return a point wins;
//! if none does, the crop falls back to the center. `auto` is skin tone then
//! edge density, so portraits center on people and everything else on detail.
//!
//! ## No Face Detection Model
//!
//! The `face` method is a skin-tone color classifier over 20px blocks, not a
//! trained detector. It is fast, has no model files, and is good enough to
//! keep heads in frame. Pluggable detectors would go behind another
//! [`imaging::Strategy`].
//!
//! ## Float Rectangles
//!
//! Crop geometry stays in `f64` so the target ratio is exact. Rounding to
//! whole pixels happens once, at the renderer boundary
//! ([`imaging::Rect::to_pixels`]).

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
