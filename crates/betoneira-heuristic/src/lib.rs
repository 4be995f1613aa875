//! Local heuristic betoneira detection.
//!
//! This crate holds the purely local fallback path: the image
//! enhancement pipeline and a three-strategy contour detector (color
//! bands, edge shapes, bright blobs). It produces raw candidate
//! [`betoneira_core::Region`]s; confidence assignment and fusion with
//! the remote path live in the orchestrator crate.

mod contour;
mod detector;
mod params;
mod preprocess;

pub use contour::{mask_components, MaskComponent};
pub use detector::LocalHeuristicDetector;
pub use params::{
    ColorStrategyParams, HeuristicParams, ShapeStrategyParams, SizeStrategyParams,
};
pub use preprocess::{downscale_long_side, hue_band_mask, PreprocessParams, Preprocessor};
