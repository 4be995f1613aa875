//! HTTP implementation of [`InferenceClient`].
//!
//! Submits the payload base64-encoded as a form body, the upload shape
//! hosted detection APIs accept for `POST {api_url}/{model_id}`.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ureq::{Agent, AgentBuilder};

use crate::client::{InferOptions, InferenceClient, InferenceResponse, RemoteError};
use crate::payload::SubmissionPayload;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for a hosted detection model.
#[derive(Debug)]
pub struct HttpInferenceClient {
    agent: Agent,
    api_url: String,
    api_key: String,
    model_id: String,
}

impl HttpInferenceClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self::with_timeout(api_url, api_key, model_id, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let api_url: String = api_url.into();
        Self {
            agent: AgentBuilder::new().timeout(timeout).build(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_id: model_id.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.api_url, self.model_id)
    }
}

impl InferenceClient for HttpInferenceClient {
    fn infer(
        &self,
        payload: &SubmissionPayload,
        options: &InferOptions,
    ) -> Result<InferenceResponse, RemoteError> {
        let body = BASE64.encode(payload.bytes());
        let confidence = ((options.confidence * 100.0).round() as u32).to_string();
        let overlap = ((options.overlap * 100.0).round() as u32).to_string();

        log::debug!(
            "submitting {} payload ({} bytes) to {}",
            payload.variant().as_str(),
            payload.bytes().len(),
            self.endpoint()
        );

        let response = self
            .agent
            .post(&self.endpoint())
            .query("api_key", &self.api_key)
            .query("confidence", &confidence)
            .query("overlap", &overlap)
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(&body);

        match response {
            Ok(resp) => {
                let envelope: InferenceResponse = resp.into_json()?;
                log::debug!(
                    "endpoint returned {} prediction(s)",
                    envelope.predictions.len()
                );
                Ok(envelope)
            }
            Err(ureq::Error::Status(code, _)) => Err(RemoteError::Status { code }),
            Err(ureq::Error::Transport(t)) => Err(RemoteError::Transport(t.to_string())),
        }
    }
}
