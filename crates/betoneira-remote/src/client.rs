//! Client trait and wire types for the hosted detection model.

use serde::Deserialize;
use thiserror::Error;

use crate::payload::{PayloadError, SubmissionPayload};

/// Per-request tuning forwarded to the inference endpoint. Values are
/// fractions in `[0, 1]`; the HTTP layer converts them to the percent
/// form the API expects.
#[derive(Clone, Copy, Debug)]
pub struct InferOptions {
    /// Minimum confidence the model should report predictions at.
    pub confidence: f32,
    /// Overlap threshold for the model's server-side suppression.
    pub overlap: f32,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            overlap: 0.3,
        }
    }
}

/// One model prediction in center-based geometry: `x`/`y` is the box
/// center, `width`/`height` its full extent, all in pixels of the
/// submitted image.
#[derive(Clone, Debug, Deserialize)]
pub struct Prediction {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f32,
    #[serde(rename = "class")]
    pub class_name: String,
}

/// The prediction envelope returned by the endpoint. A response without
/// a `predictions` field decodes as empty rather than failing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("inference API returned HTTP {code}")]
    Status { code: u16 },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("decoding inference response: {0}")]
    Decode(#[from] std::io::Error),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("remote inference is disabled")]
    Offline,
}

/// Anything that can turn a submission payload into predictions.
///
/// The orchestrator is generic over this trait, which keeps fusion
/// logic testable without a live endpoint.
pub trait InferenceClient {
    fn infer(
        &self,
        payload: &SubmissionPayload,
        options: &InferOptions,
    ) -> Result<InferenceResponse, RemoteError>;
}

/// Client that refuses every request. Plugging it into the orchestrator
/// forces the purely local detection path.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineInferenceClient;

impl InferenceClient for OfflineInferenceClient {
    fn infer(
        &self,
        _payload: &SubmissionPayload,
        _options: &InferOptions,
    ) -> Result<InferenceResponse, RemoteError> {
        Err(RemoteError::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_center_based_predictions() {
        let json = r#"{
            "predictions": [
                {"x": 320.5, "y": 240.0, "width": 110.0, "height": 95.0,
                 "confidence": 0.87, "class": "betoneira"}
            ],
            "time": 0.04
        }"#;
        let resp: InferenceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.predictions.len(), 1);
        let p = &resp.predictions[0];
        assert_eq!(p.class_name, "betoneira");
        assert!((p.x - 320.5).abs() < f64::EPSILON);
        assert!((p.confidence - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn envelope_without_predictions_field_is_empty() {
        let resp: InferenceResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.predictions.is_empty());
    }

    #[test]
    fn offline_client_always_refuses() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        let payload =
            SubmissionPayload::jpeg(&img, crate::SubmissionVariant::Original).unwrap();
        let err = OfflineInferenceClient
            .infer(&payload, &InferOptions::default())
            .unwrap_err();
        assert!(matches!(err, RemoteError::Offline));
    }
}
