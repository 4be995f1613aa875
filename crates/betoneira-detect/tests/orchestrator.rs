//! End-to-end orchestration tests against a scripted inference client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};

use betoneira_detect::{
    ColorName, DetectionOrchestrator, DetectionSource, OrchestratorParams, QuantityStatus,
};
use betoneira_remote::{
    InferOptions, InferenceClient, InferenceResponse, Prediction, RemoteError, SubmissionPayload,
    SubmissionVariant,
};

/// Replays a prepared script of responses and records which submission
/// variants the orchestrator tried, in order.
#[derive(Default)]
struct FixtureClient {
    script: Mutex<VecDeque<Result<InferenceResponse, RemoteError>>>,
    seen: Mutex<Vec<SubmissionVariant>>,
}

impl FixtureClient {
    fn scripted(steps: Vec<Result<InferenceResponse, RemoteError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<SubmissionVariant> {
        self.seen.lock().unwrap().clone()
    }
}

impl InferenceClient for FixtureClient {
    fn infer(
        &self,
        payload: &SubmissionPayload,
        _options: &InferOptions,
    ) -> Result<InferenceResponse, RemoteError> {
        self.seen.lock().unwrap().push(payload.variant());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(InferenceResponse::default()))
    }
}

/// Shareable handle the orchestrator can own while the test keeps its
/// own reference to the fixture's recordings.
struct SharedClient(Arc<FixtureClient>);

impl InferenceClient for SharedClient {
    fn infer(
        &self,
        payload: &SubmissionPayload,
        options: &InferOptions,
    ) -> Result<InferenceResponse, RemoteError> {
        self.0.infer(payload, options)
    }
}

fn prediction(x: f64, y: f64, w: f64, h: f64, confidence: f32) -> Prediction {
    Prediction {
        x,
        y,
        width: w,
        height: h,
        confidence,
        class_name: "betoneira".to_string(),
    }
}

fn response(predictions: Vec<Prediction>) -> Result<InferenceResponse, RemoteError> {
    Ok(InferenceResponse { predictions })
}

fn flat_gray(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb([128, 128, 128]))
}

/// A large orange square with a soft 24-pixel ramp into the gray
/// background. The ramp keeps luma gradients below the edge detector's
/// thresholds, so only the color strategy fires on it.
fn soft_orange_square() -> RgbImage {
    const BG: [f32; 3] = [128.0, 128.0, 128.0];
    const FG: [f32; 3] = [220.0, 120.0, 30.0];
    const RAMP: f32 = 24.0;
    // Core square (250, 170)-(380, 300).
    RgbImage::from_fn(640, 480, |x, y| {
        let dx = (250 - x as i32).max(x as i32 - 379).max(0) as f32;
        let dy = (170 - y as i32).max(y as i32 - 299).max(0) as f32;
        let t = (1.0 - dx.max(dy) / RAMP).clamp(0.0, 1.0);
        Rgb([
            (BG[0] + (FG[0] - BG[0]) * t).round() as u8,
            (BG[1] + (FG[1] - BG[1]) * t).round() as u8,
            (BG[2] + (FG[2] - BG[2]) * t).round() as u8,
        ])
    })
}

#[test]
fn accepted_remote_predictions_become_remote_detections() {
    let client = FixtureClient::scripted(vec![response(vec![
        prediction(130.0, 130.0, 60.0, 60.0, 0.3),
        prediction(330.0, 230.0, 80.0, 80.0, 0.4),
        prediction(500.0, 300.0, 40.0, 40.0, 0.2), // below the 0.25 floor
    ])]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let result = orchestrator.detect(&flat_gray(640, 480), 2).unwrap();

    assert_eq!(result.total_detected, 2);
    assert_eq!(result.remote_count, 2);
    assert_eq!(result.local_count, 0);
    assert_eq!(result.quantity_status, QuantityStatus::Match);
    assert_eq!(result.detections[0].id, "R001");
    assert_eq!(result.detections[1].id, "R002");
    assert!(result
        .detections
        .iter()
        .all(|d| d.source == DetectionSource::Remote));
    // First usable attempt wins; no further variants are tried.
    assert_eq!(client.seen(), vec![SubmissionVariant::Original]);
}

#[test]
fn empty_attempts_walk_the_variant_ladder_in_order() {
    let client = FixtureClient::scripted(vec![
        response(vec![]),
        response(vec![]),
        response(vec![]),
        response(vec![prediction(320.0, 240.0, 100.0, 100.0, 0.9)]),
    ]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let result = orchestrator.detect(&flat_gray(640, 480), 1).unwrap();

    assert_eq!(result.remote_count, 1);
    assert_eq!(result.quantity_status, QuantityStatus::Match);
    assert_eq!(
        client.seen(),
        vec![
            SubmissionVariant::Original,
            SubmissionVariant::Enhanced,
            SubmissionVariant::Downscaled,
            SubmissionVariant::HighQuality,
        ]
    );
}

#[test]
fn downscaled_predictions_are_mapped_back_to_original_pixels() {
    let client = FixtureClient::scripted(vec![
        Err(RemoteError::Offline),
        Err(RemoteError::Offline),
        // This answer lands on the downscaled rendition (640x480 for a
        // 1280x960 input), so its geometry is in that space.
        response(vec![prediction(320.0, 240.0, 100.0, 80.0, 0.5)]),
    ]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let result = orchestrator.detect(&flat_gray(1280, 960), 1).unwrap();

    assert_eq!(result.remote_count, 1);
    let bbox = result.detections[0].bbox;
    assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (540, 400, 740, 560));
    assert_eq!(
        client.seen(),
        vec![
            SubmissionVariant::Original,
            SubmissionVariant::Enhanced,
            SubmissionVariant::Downscaled,
        ]
    );
}

#[test]
fn exhausted_remote_path_falls_back_to_local_heuristics() {
    let client = FixtureClient::scripted(vec![
        Err(RemoteError::Offline),
        Err(RemoteError::Offline),
        Err(RemoteError::Offline),
        Err(RemoteError::Offline),
    ]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let image = soft_orange_square();
    let result = orchestrator.detect(&image, 1).unwrap();

    assert_eq!(client.seen().len(), 4);
    assert_eq!(result.total_detected, 1);
    assert_eq!(result.local_count, 1);
    assert_eq!(result.quantity_status, QuantityStatus::Match);

    let d = &result.detections[0];
    assert_eq!(d.id, "L001");
    assert_eq!(d.source, DetectionSource::Local);
    assert_eq!(d.class_name, "betoneira");
    assert_eq!(d.color, ColorName::Orange);
    // Large color region: base 0.7 plus the large-region bonus.
    assert!((d.confidence - 0.9).abs() < 1e-6);
    // The box sits on the square, not somewhere else in the frame.
    assert!(d.bbox.x1 >= 200 && d.bbox.x2 <= 430);
    assert!(d.bbox.y1 >= 120 && d.bbox.y2 <= 350);
}

#[test]
fn answered_attempt_ends_the_ladder_even_when_everything_is_below_floor() {
    // The first attempt gets a real answer, just nothing confident
    // enough. That answer is final: no later variant may be consulted,
    // and the empty remote outcome hands over to the local detector.
    let client = FixtureClient::scripted(vec![
        response(vec![prediction(130.0, 130.0, 60.0, 60.0, 0.05)]),
        response(vec![prediction(330.0, 230.0, 80.0, 80.0, 0.9)]),
    ]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let result = orchestrator.detect(&soft_orange_square(), 1).unwrap();

    assert_eq!(client.seen(), vec![SubmissionVariant::Original]);
    assert_eq!(result.remote_count, 0);
    assert_eq!(result.local_count, 1);
    assert_eq!(result.detections[0].id, "L001");
    assert_eq!(result.detections[0].source, DetectionSource::Local);
}

#[test]
fn nothing_anywhere_yields_an_empty_mismatching_result() {
    let client = FixtureClient::scripted(vec![]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let image = flat_gray(640, 480);
    let result = orchestrator.detect(&image, 1).unwrap();

    assert_eq!(result.total_detected, 0);
    assert_eq!(result.quantity_status, QuantityStatus::Mismatch);
    assert_eq!(result.annotated.dimensions(), (640, 480));
    // Every variant was still attempted before giving up.
    assert_eq!(client.seen().len(), 4);
}

#[test]
fn aggressive_params_lower_the_floor() {
    let client = FixtureClient::scripted(vec![response(vec![
        prediction(130.0, 130.0, 60.0, 60.0, 0.15),
        prediction(400.0, 300.0, 60.0, 60.0, 0.05), // still below the 0.1 floor
    ])]);
    let orchestrator =
        DetectionOrchestrator::with_params(SharedClient(Arc::clone(&client)), OrchestratorParams::aggressive());

    let result = orchestrator.detect(&flat_gray(640, 480), 1).unwrap();
    assert_eq!(result.remote_count, 1);
    assert!((result.detections[0].confidence - 0.15).abs() < 1e-6);
    assert_eq!(result.quantity_status, QuantityStatus::Match);
}

#[test]
fn detection_boxes_stay_inside_the_image() {
    // A prediction hanging off the edge must clamp, not wrap or panic.
    let client = FixtureClient::scripted(vec![response(vec![prediction(
        630.0, 470.0, 100.0, 100.0, 0.8,
    )])]);
    let orchestrator = DetectionOrchestrator::new(SharedClient(Arc::clone(&client)));

    let result = orchestrator.detect(&flat_gray(640, 480), 1).unwrap();
    let bbox = result.detections[0].bbox;
    assert!(bbox.x2 <= 640 && bbox.y2 <= 480);
    assert!(bbox.x1 < bbox.x2 && bbox.y1 < bbox.y2);
}
