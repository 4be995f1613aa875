//! Remote/local fusion.
//!
//! The orchestrator submits the image to the remote model in up to four
//! renditions, stopping at the first attempt that yields predictions at
//! or above the confidence floor. When every attempt fails or comes
//! back empty it falls back to the local heuristic detector and scores
//! its regions from a fixed per-strategy confidence table.

use std::borrow::Cow;
use std::path::Path;

use image::RgbImage;
use thiserror::Error;

use betoneira_core::{
    classify_color, BBox, DetectMethod, Detection, DetectionResult, DetectionSource,
};
use betoneira_heuristic::{
    downscale_long_side, HeuristicParams, LocalHeuristicDetector, PreprocessParams, Preprocessor,
};
use betoneira_remote::{
    InferOptions, InferenceClient, PayloadError, Prediction, SubmissionPayload, SubmissionVariant,
};

use crate::annotate::annotate;

/// Class label attached to local detections; the remote model reports
/// its own labels.
const LOCAL_CLASS: &str = "betoneira";

/// Base confidence per local strategy. Color matches are the strongest
/// signal, bright-blob matches the weakest.
const LOCAL_BASE_COLOR: f32 = 0.7;
const LOCAL_BASE_SHAPE: f32 = 0.6;
const LOCAL_BASE_SIZE: f32 = 0.5;
/// Bonus for regions covering a substantial share of the frame, and the
/// cap local confidence never exceeds.
const LOCAL_LARGE_BONUS: f32 = 0.2;
const LOCAL_CONFIDENCE_CAP: f32 = 0.9;
const LARGE_REGION_FRAC: f64 = 0.05;

const SUBMISSION_ORDER: [SubmissionVariant; 4] = [
    SubmissionVariant::Original,
    SubmissionVariant::Enhanced,
    SubmissionVariant::Downscaled,
    SubmissionVariant::HighQuality,
];

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("loading image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Tuning for [`DetectionOrchestrator`].
#[derive(Clone, Debug)]
pub struct OrchestratorParams {
    /// Remote predictions below this confidence are discarded.
    pub confidence_floor: f32,
    /// Options forwarded to the inference endpoint.
    pub infer: InferOptions,
    /// Long-side target of the downscaled submission variant.
    pub downscale_target: u32,
}

impl OrchestratorParams {
    /// Accept only confident remote predictions. The default.
    pub fn conservative() -> Self {
        Self {
            confidence_floor: 0.25,
            infer: InferOptions::default(),
            downscale_target: 640,
        }
    }

    /// Lower the floor for scenes where missing a betoneira is worse
    /// than an occasional false positive.
    pub fn aggressive() -> Self {
        Self {
            confidence_floor: 0.1,
            infer: InferOptions {
                confidence: 0.1,
                ..InferOptions::default()
            },
            ..Self::conservative()
        }
    }
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Drives remote attempts and the local fallback for one client.
#[derive(Debug)]
pub struct DetectionOrchestrator<C: InferenceClient> {
    client: C,
    params: OrchestratorParams,
    detector: LocalHeuristicDetector,
    preprocessor: Preprocessor,
}

impl<C: InferenceClient> DetectionOrchestrator<C> {
    pub fn new(client: C) -> Self {
        Self::with_params(client, OrchestratorParams::default())
    }

    pub fn with_params(client: C, params: OrchestratorParams) -> Self {
        Self {
            client,
            params,
            detector: LocalHeuristicDetector::new(HeuristicParams::default()),
            preprocessor: Preprocessor::new(PreprocessParams::default()),
        }
    }

    /// Replace the local detector, keeping the rest of the setup.
    pub fn with_detector(mut self, detector: LocalHeuristicDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    /// Run the full detection flow on an in-memory image.
    ///
    /// Remote failures are logged and absorbed by the fallback; only
    /// payload encoding can fail here.
    pub fn detect(
        &self,
        image: &RgbImage,
        expected_count: u32,
    ) -> Result<DetectionResult, DetectError> {
        let detections = {
            let remote = self.remote_detections(image)?;
            if remote.is_empty() {
                log::info!("remote path yielded nothing; falling back to local heuristics");
                self.local_detections(image)
            } else {
                remote
            }
        };

        let annotated = annotate(image, &detections);
        Ok(DetectionResult::assemble(detections, expected_count, annotated))
    }

    /// Convenience wrapper: load `path` from disk and run [`Self::detect`].
    pub fn detect_path(
        &self,
        path: impl AsRef<Path>,
        expected_count: u32,
    ) -> Result<DetectionResult, DetectError> {
        let image = image::open(path)?.to_rgb8();
        self.detect(&image, expected_count)
    }

    /// Try each submission variant in order until one yields accepted
    /// predictions. Returns an empty vector when all attempts fail or
    /// come back below the floor.
    fn remote_detections(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 {
            return Ok(Vec::new());
        }

        for variant in SUBMISSION_ORDER {
            let rendition: Cow<'_, RgbImage> = match variant {
                SubmissionVariant::Original | SubmissionVariant::HighQuality => {
                    Cow::Borrowed(image)
                }
                SubmissionVariant::Enhanced => Cow::Owned(self.preprocessor.enhance(image)),
                SubmissionVariant::Downscaled => {
                    Cow::Owned(downscale_long_side(image, self.params.downscale_target))
                }
            };

            let payload = SubmissionPayload::jpeg(&rendition, variant)?;
            let response = match self.client.infer(&payload, &self.params.infer) {
                Ok(response) => response,
                Err(err) => {
                    log::warn!("remote attempt ({}) failed: {err}", variant.as_str());
                    continue;
                }
            };

            // Predictions arrive in the rendition's pixel space; map
            // them back onto the original image before clamping.
            let sx = img_w as f64 / rendition.width() as f64;
            let sy = img_h as f64 / rendition.height() as f64;

            // The first attempt that produces any raw predictions ends
            // the ladder; what survives the floor and clamping (possibly
            // nothing) is the remote path's final answer.
            if response.predictions.is_empty() {
                log::debug!("remote attempt ({}) returned no predictions", variant.as_str());
                continue;
            }

            let accepted: Vec<&Prediction> = response
                .predictions
                .iter()
                .filter(|p| p.confidence >= self.params.confidence_floor)
                .collect();
            log::debug!(
                "remote attempt ({}): {} prediction(s), {} at or above floor {}",
                variant.as_str(),
                response.predictions.len(),
                accepted.len(),
                self.params.confidence_floor
            );

            let detections: Vec<Detection> = accepted
                .iter()
                .filter_map(|p| {
                    BBox::from_center(p.x * sx, p.y * sy, p.width * sx, p.height * sy, img_w, img_h)
                        .map(|bbox| (bbox, *p))
                })
                .enumerate()
                .map(|(i, (bbox, p))| Detection {
                    id: format!("{}{:03}", DetectionSource::Remote.id_prefix(), i + 1),
                    bbox,
                    confidence: p.confidence,
                    color: classify_color(image, bbox),
                    class_name: p.class_name.clone(),
                    source: DetectionSource::Remote,
                })
                .collect();

            if detections.is_empty() {
                log::info!(
                    "remote attempt ({}) answered but nothing passed the floor",
                    variant.as_str()
                );
            } else {
                log::info!(
                    "remote attempt ({}) accepted with {} detection(s)",
                    variant.as_str(),
                    detections.len()
                );
            }
            return Ok(detections);
        }

        Ok(Vec::new())
    }

    /// Score the local detector's regions with the per-strategy table.
    fn local_detections(&self, image: &RgbImage) -> Vec<Detection> {
        let image_area = image.width() as f64 * image.height() as f64;
        self.detector
            .detect(image)
            .into_iter()
            .enumerate()
            .map(|(i, region)| {
                let base = match region.method {
                    DetectMethod::Color => LOCAL_BASE_COLOR,
                    DetectMethod::Shape => LOCAL_BASE_SHAPE,
                    // The local pool never carries remote regions.
                    DetectMethod::Size | DetectMethod::Remote => LOCAL_BASE_SIZE,
                };
                let confidence = if region.area > LARGE_REGION_FRAC * image_area {
                    (base + LOCAL_LARGE_BONUS).min(LOCAL_CONFIDENCE_CAP)
                } else {
                    base
                };
                Detection {
                    id: format!("{}{:03}", DetectionSource::Local.id_prefix(), i + 1),
                    bbox: region.bbox,
                    confidence,
                    color: classify_color(image, region.bbox),
                    class_name: LOCAL_CLASS.to_string(),
                    source: DetectionSource::Local,
                }
            })
            .collect()
    }
}
