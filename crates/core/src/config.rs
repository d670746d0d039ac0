use crate::error::ServiceError;

pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";
const API_KEY_ENV_ALIAS: &str = "HUGGINGFACEHUB_API_TOKEN";

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/";
pub const DEFAULT_GENERATION_MODEL: &str = "google/flan-t5-large";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 20,
            top_k: 4,
            embedding_batch_size: 32,
        }
    }
}

/// Settings for the hosted inference service. The credential stays optional
/// here so that offline components can run without it; clients that need it
/// call [`InferenceConfig::require_api_key`].
#[derive(Clone)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_length: u32,
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("generation_model", &self.generation_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_INFERENCE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.7,
            max_length: 512,
        }
    }
}

impl InferenceConfig {
    pub fn from_env() -> Self {
        let api_key = read_trimmed_env(API_KEY_ENV).or_else(|| read_trimmed_env(API_KEY_ENV_ALIAS));
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.and_then(|value| non_blank(&value));
        self
    }

    pub fn require_api_key(&self) -> Result<&str, ServiceError> {
        self.api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential(API_KEY_ENV))
    }
}

fn read_trimmed_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| non_blank(&value))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_defaults_match_documented_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size, 1_000);
        assert_eq!(config.chunk_overlap, 20);
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = InferenceConfig::default().with_api_key(Some("   ".to_string()));
        let error = config.require_api_key().expect_err("blank key must be rejected");
        assert!(matches!(error, ServiceError::MissingCredential(API_KEY_ENV)));
    }

    #[test]
    fn api_key_is_trimmed_and_redacted_in_debug() {
        let config = InferenceConfig::default().with_api_key(Some(" hf_secret \n".to_string()));
        assert_eq!(config.require_api_key().ok(), Some("hf_secret"));
        assert!(!format!("{config:?}").contains("hf_secret"));
    }
}
