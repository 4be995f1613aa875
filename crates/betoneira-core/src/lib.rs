//! Core types and pure algorithms for betoneira detection.
//!
//! This crate is intentionally small and free of any network or heuristic
//! detector code. It holds the shared data model (boxes, regions,
//! detections), the overlap deduplicator and the hue-based color
//! classifier that both the remote and the local detection paths feed
//! their regions through.

mod bbox;
mod color;
mod dedup;
mod detection;
mod hsv;
mod logger;

pub use bbox::{BBox, DetectMethod, Region};
pub use color::{classify_color, hue_to_color, ColorName};
pub use dedup::{dedup_regions, DEFAULT_IOU_THRESHOLD};
pub use detection::{Detection, DetectionResult, DetectionSource, QuantityStatus};
pub use hsv::{rgb_to_hsv, Hsv, HueBand};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_LEVEL_ENV};
