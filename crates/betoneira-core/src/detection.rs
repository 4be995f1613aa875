use image::RgbImage;
use serde::Serialize;

use crate::bbox::BBox;
use crate::color::ColorName;

/// Which detection path produced a finalized detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Remote,
    Local,
}

impl DetectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionSource::Remote => "remote",
            DetectionSource::Local => "local",
        }
    }

    /// Prefix used when assigning sequential per-source detection IDs.
    pub fn id_prefix(&self) -> char {
        match self {
            DetectionSource::Remote => 'R',
            DetectionSource::Local => 'L',
        }
    }
}

/// A finalized detection: a clamped box plus its identity and metadata.
#[derive(Clone, Debug, Serialize)]
pub struct Detection {
    /// Source-prefixed sequential ID, unique within one result
    /// (`R001`, `R002`, ..., `L001`, ...).
    pub id: String,
    pub bbox: BBox,
    /// Confidence in `[0, 1]`; remote scores pass through, local scores
    /// come from the per-method heuristic table.
    pub confidence: f32,
    pub color: ColorName,
    /// Class label reported by the model, or the local placeholder class.
    pub class_name: String,
    pub source: DetectionSource,
}

/// Comparison of the detected count against the caller-supplied
/// expectation. Reporting data only; it never feeds back into detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityStatus {
    Match,
    Mismatch,
}

/// Aggregate output of one orchestrated detection call.
///
/// Everything except the annotated pixel buffer serializes to JSON for
/// the reporting layer; the buffer itself is handed over as-is.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub total_detected: usize,
    pub remote_count: usize,
    pub local_count: usize,
    pub expected_count: u32,
    pub quantity_status: QuantityStatus,
    #[serde(skip)]
    pub annotated: RgbImage,
}

impl DetectionResult {
    /// Assemble a result from finalized detections, deriving the counts
    /// and the quantity comparison.
    pub fn assemble(
        detections: Vec<Detection>,
        expected_count: u32,
        annotated: RgbImage,
    ) -> Self {
        let remote_count = detections
            .iter()
            .filter(|d| d.source == DetectionSource::Remote)
            .count();
        let local_count = detections.len() - remote_count;
        let total_detected = detections.len();
        let quantity_status = if total_detected as u32 == expected_count {
            QuantityStatus::Match
        } else {
            QuantityStatus::Mismatch
        };
        Self {
            detections,
            total_detected,
            remote_count,
            local_count,
            expected_count,
            quantity_status,
            annotated,
        }
    }
}
