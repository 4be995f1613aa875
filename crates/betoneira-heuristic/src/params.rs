use betoneira_core::{HueBand, DEFAULT_IOU_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Configuration for the color-band strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColorStrategyParams {
    /// Hue bands plausible for betoneira paint. The red band is split
    /// across the hue wrap-around, hence two entries for red.
    pub bands: Vec<HueBand>,
    /// Minimum saturation for a pixel to join a band mask.
    pub min_saturation: u8,
    /// Minimum brightness for a pixel to join a band mask.
    pub min_value: u8,
    /// Minimum contour area in pixels.
    pub min_area: f64,
    /// Maximum contour area as a fraction of the image area.
    pub max_area_frac: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Minimum contour-area / convex-hull-area ratio. Betoneira drums
    /// are compact; sprawling low-solidity blobs are noise.
    pub min_solidity: f64,
}

impl Default for ColorStrategyParams {
    fn default() -> Self {
        Self {
            bands: vec![
                HueBand::new(10, 25),  // orange
                HueBand::new(0, 10),   // red, low side of the wrap
                HueBand::new(170, 179), // red, high side of the wrap
                HueBand::new(100, 130), // blue
                HueBand::new(26, 35),  // yellow
            ],
            min_saturation: 100,
            min_value: 100,
            min_area: 5_000.0,
            max_area_frac: 0.2,
            min_aspect: 0.4,
            max_aspect: 2.2,
            min_solidity: 0.6,
        }
    }
}

/// Configuration for the edge/shape strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeStrategyParams {
    /// Gaussian sigma applied before edge detection.
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Morphological closing radius bridging broken contours.
    pub close_radius: u8,
    /// Dilation radius applied after closing.
    pub dilate_radius: u8,
    pub min_area: f64,
    pub max_area_frac: f64,
    /// Accepted polygon-approximation vertex count range; a betoneira
    /// silhouette approximates to a handful of segments, not a blob
    /// outline with dozens.
    pub min_vertices: usize,
    pub max_vertices: usize,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Minimum contour-area / bounding-box-area ratio.
    pub min_extent: f64,
}

impl Default for ShapeStrategyParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.4,
            canny_low: 30.0,
            canny_high: 100.0,
            close_radius: 2,
            dilate_radius: 1,
            min_area: 3_000.0,
            max_area_frac: 0.15,
            min_vertices: 4,
            max_vertices: 10,
            min_aspect: 0.5,
            max_aspect: 1.8,
            min_extent: 0.5,
        }
    }
}

/// Configuration for the size/position strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SizeStrategyParams {
    /// Global brightness threshold isolating bright machinery.
    pub brightness_threshold: u8,
    pub min_area: f64,
    pub max_area_frac: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Reject boxes within this fraction of the image dimension of any
    /// edge; objects cut off by the frame are border artifacts.
    pub border_margin_frac: f64,
}

impl Default for SizeStrategyParams {
    fn default() -> Self {
        Self {
            brightness_threshold: 200,
            min_area: 8_000.0,
            max_area_frac: 0.25,
            min_aspect: 0.6,
            max_aspect: 1.5,
            border_margin_frac: 0.05,
        }
    }
}

/// Top-level configuration for [`crate::LocalHeuristicDetector`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeuristicParams {
    pub color: ColorStrategyParams,
    pub shape: ShapeStrategyParams,
    pub size: SizeStrategyParams,
    /// IoU at or above which pooled candidates are deduplicated.
    pub iou_threshold: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            color: ColorStrategyParams::default(),
            shape: ShapeStrategyParams::default(),
            size: SizeStrategyParams::default(),
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}
