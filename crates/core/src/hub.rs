//! Thin JSON client for the Hugging Face Inference API, shared by the hosted
//! embedder and the hosted language model.

use crate::config::InferenceConfig;
use crate::error::ServiceError;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub(crate) const BACKEND: &str = "huggingface";

#[derive(Clone)]
pub(crate) struct HubClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HubClient {
    pub(crate) fn new(config: &InferenceConfig) -> Result<Self, ServiceError> {
        let api_key = config.require_api_key()?.to_string();
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(&base)?,
            api_key,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path)?)
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ServiceError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_payload(&url, status, &body)
    }
}

/// Non-JSON bodies on an error status still surface the status; on success
/// they are a malformed response carrying the decode error.
fn decode_payload(url: &Url, status: StatusCode, body: &str) -> Result<Value, ServiceError> {
    let parsed = serde_json::from_str::<Value>(body);

    if !status.is_success() {
        let details = parsed
            .ok()
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| status.to_string());
        return Err(ServiceError::BackendResponse {
            backend: BACKEND.to_string(),
            details: format!("{url} returned {status}: {details}"),
        });
    }

    let payload = parsed
        .map_err(|error| malformed(format!("{url} returned a non-JSON body: {error}")))?;

    if let Some(details) = error_message(&payload) {
        return Err(ServiceError::BackendResponse {
            backend: BACKEND.to_string(),
            details,
        });
    }

    Ok(payload)
}

/// The API reports failures as `{"error": "..."}`, sometimes with a 200 status.
pub(crate) fn error_message(payload: &Value) -> Option<String> {
    payload
        .get("error")
        .map(|error| match error {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        })
}

pub(crate) fn malformed(details: impl Into<String>) -> ServiceError {
    ServiceError::MalformedResponse {
        backend: BACKEND.to_string(),
        details: details.into(),
    }
}
