//! Fused betoneira detection.
//!
//! This is the entry-point crate: it drives the remote inference
//! attempts across submission variants, falls back to the local
//! heuristic detector when the remote path yields nothing, classifies
//! each detection's dominant color and annotates the result.
//!
//! ```no_run
//! use betoneira_detect::{DetectionOrchestrator, OrchestratorParams};
//! use betoneira_remote::HttpInferenceClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpInferenceClient::new(
//!     "https://detect.example.com",
//!     "secret-key",
//!     "betoneira-detector/1",
//! );
//! let orchestrator = DetectionOrchestrator::new(client);
//! let image = image::open("yard.jpg")?.to_rgb8();
//! let result = orchestrator.detect(&image, 3)?;
//! println!("{} betoneira(s) found", result.total_detected);
//! # Ok(())
//! # }
//! ```

mod annotate;
mod orchestrator;

pub use annotate::{annotate, LOCAL_BOX_COLOR, REMOTE_BOX_COLOR};
pub use orchestrator::{DetectError, DetectionOrchestrator, OrchestratorParams};

pub use betoneira_core::{
    BBox, ColorName, Detection, DetectionResult, DetectionSource, QuantityStatus,
};
pub use betoneira_heuristic::{HeuristicParams, LocalHeuristicDetector, Preprocessor};
pub use betoneira_remote::{
    HttpInferenceClient, InferOptions, InferenceClient, OfflineInferenceClient,
};
