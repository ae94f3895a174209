use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::config::BackendConfig;

use super::payload::Payload;
use super::{SubmissionOutcome, SubmissionVariant};

/// Marker the backend leaks when it saved the record but failed to serialize the response.
pub const SERIALIZATION_SUCCESS_MARKER: &str = "ByteBuddyInterceptor";

/// Raw backend answer, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("backend client unavailable: {0}")]
    Backend(String),
}

/// Outbound POST of a payload to the backend.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(
        &self,
        variant: SubmissionVariant,
        payload: &Payload,
        credential: Option<&str>,
    ) -> Result<TransportResponse, TransportError>;
}

/// Turn a transport result into the single outcome the wizard consumes.
pub fn classify(
    variant: SubmissionVariant,
    result: Result<TransportResponse, TransportError>,
) -> SubmissionOutcome {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(variant = variant.label(), error = %err, "submission transport failed");
            return SubmissionOutcome::Failure {
                status: None,
                message: err.to_string(),
            };
        }
    };

    let parsed = serde_json::from_str::<Value>(&response.body).ok();
    if response.is_success() {
        return SubmissionOutcome::Success { body: parsed };
    }

    if response.body.contains(SERIALIZATION_SUCCESS_MARKER) {
        tracing::info!(
            variant = variant.label(),
            status = response.status,
            "backend saved the submission but could not serialize its response"
        );
        return SubmissionOutcome::SuccessViaShim;
    }

    let message = parsed
        .as_ref()
        .and_then(|body| {
            ["error", "message"]
                .iter()
                .find_map(|field| body.get(*field).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));

    tracing::warn!(
        variant = variant.label(),
        status = response.status,
        %message,
        "submission rejected by backend"
    );
    SubmissionOutcome::Failure {
        status: Some(response.status),
        message,
    }
}

/// reqwest-backed transport against the configured backend.
#[derive(Debug, Clone)]
pub struct HttpSubmissionTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSubmissionTransport {
    pub fn new(config: &BackendConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| TransportError::Backend(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn endpoint(&self, variant: SubmissionVariant) -> String {
        format!("{}{}", self.base_url, variant.path())
    }
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn submit(
        &self,
        variant: SubmissionVariant,
        payload: &Payload,
        credential: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.post(self.endpoint(variant)).json(payload);
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| TransportError::Http(err.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Http(err.to_string()))?;

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
