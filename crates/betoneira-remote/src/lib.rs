//! Remote inference for betoneira detection.
//!
//! Wraps a hosted detection model behind the [`InferenceClient`] trait:
//! images are encoded as JPEG payloads, submitted base64-encoded over
//! HTTP and the prediction envelope is decoded back into typed
//! [`Prediction`]s. The orchestrator crate drives retries across
//! submission variants and fuses the output with the local detector.

mod client;
mod http;
mod payload;

pub use client::{
    InferOptions, InferenceClient, InferenceResponse, OfflineInferenceClient, Prediction,
    RemoteError,
};
pub use http::{HttpInferenceClient, DEFAULT_TIMEOUT};
pub use payload::{PayloadError, SubmissionPayload, SubmissionVariant};
