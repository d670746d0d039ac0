use crate::config::InferenceConfig;
use crate::error::ServiceError;
use crate::hub::{malformed, HubClient};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the completion for `prompt`. Implementations reject blank output.
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
struct GenerationParameters {
    temperature: f32,
    max_length: u32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
    options: GenerationOptions,
}

/// Text generation through the hosted inference API.
pub struct HuggingFaceHub {
    hub: HubClient,
    model: String,
    parameters: GenerationParameters,
}

impl HuggingFaceHub {
    pub fn new(config: &InferenceConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            hub: HubClient::new(config)?,
            model: config.generation_model.clone(),
            parameters: GenerationParameters {
                temperature: config.temperature,
                max_length: config.max_length,
            },
        })
    }
}

#[async_trait]
impl LanguageModel for HuggingFaceHub {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        let payload = self
            .hub
            .post_json(
                &format!("models/{}", self.model),
                &GenerationRequest {
                    inputs: prompt,
                    parameters: &self.parameters,
                    options: GenerationOptions {
                        wait_for_model: true,
                    },
                },
            )
            .await?;

        parse_generation(&payload)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Accepts `[{"generated_text": ..}]` and `{"generated_text": ..}`.
fn parse_generation(payload: &Value) -> Result<String, ServiceError> {
    let generated = match payload {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        Value::Object(_) => payload.get("generated_text"),
        _ => None,
    }
    .and_then(Value::as_str)
    .ok_or_else(|| malformed(format!("no generated_text in response: {payload}")))?;

    let answer = generated.trim();
    if answer.is_empty() {
        return Err(malformed("model returned an empty completion"));
    }

    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_and_object_payloads_parse() {
        let listed = parse_generation(&json!([{"generated_text": " Paris \n"}])).unwrap();
        assert_eq!(listed, "Paris");

        let single = parse_generation(&json!({"generated_text": "Lyon"})).unwrap();
        assert_eq!(single, "Lyon");
    }

    #[test]
    fn blank_or_missing_text_is_malformed() {
        for payload in [json!([{"generated_text": "   "}]), json!([]), json!("text"), json!({})] {
            let error = parse_generation(&payload).unwrap_err();
            assert!(matches!(error, ServiceError::MalformedResponse { .. }), "{payload}");
        }
    }

    #[test]
    fn request_serializes_documented_parameters() {
        let parameters = GenerationParameters {
            temperature: 0.7,
            max_length: 512,
        };
        let body = serde_json::to_value(GenerationRequest {
            inputs: "hello",
            parameters: &parameters,
            options: GenerationOptions {
                wait_for_model: true,
            },
        })
        .unwrap();

        assert_eq!(body["inputs"], "hello");
        assert_eq!(body["parameters"]["max_length"], 512);
        assert_eq!(body["options"]["wait_for_model"], true);
    }
}
