use crate::config::InferenceConfig;
use crate::error::ServiceError;
use crate::hub::{malformed, HubClient};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT: usize = 384;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Index("embedder returned no vector".to_string()))
    }
}

/// Offline embedder: hashed character trigrams, L2-normalised.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl CharacterNgramEmbedder {
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        let width = chars.len().min(3);
        for window in chars.windows(width) {
            let mut hash = 1469598103934665603u64;
            for byte in window.iter().collect::<String>().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Sentence embeddings from the hosted feature-extraction pipeline.
pub struct HuggingFaceEmbedder {
    hub: HubClient,
    model: String,
    dimensions: usize,
}

impl HuggingFaceEmbedder {
    pub fn new(config: &InferenceConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            hub: HubClient::new(config)?,
            model: config.embedding_model.clone(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, batch = texts.len(), "requesting embeddings");
        let payload = self
            .hub
            .post_json(
                &format!("pipeline/feature-extraction/{}", self.model),
                &json!({
                    "inputs": texts,
                    "options": { "wait_for_model": true },
                }),
            )
            .await?;

        parse_embeddings(payload, texts.len(), self.dimensions)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    Pooled(Vec<Vec<f32>>),
    PerToken(Vec<Vec<Vec<f32>>>),
}

fn parse_embeddings(
    payload: Value,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, ServiceError> {
    let parsed: FeatureExtraction = serde_json::from_value(payload)
        .map_err(|error| malformed(format!("unexpected embedding payload: {error}")))?;

    let vectors = match parsed {
        FeatureExtraction::Pooled(vectors) => vectors,
        FeatureExtraction::PerToken(sequences) => sequences.iter().map(|tokens| mean_pool(tokens)).collect(),
    };

    if vectors.len() != expected {
        return Err(malformed(format!(
            "expected {expected} embeddings, received {}",
            vectors.len()
        )));
    }

    if let Some(vector) = vectors.iter().find(|vector| vector.len() != dimensions) {
        return Err(malformed(format!(
            "embedding dimension {} != {dimensions}",
            vector.len()
        )));
    }

    Ok(vectors)
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let width = tokens.first().map(Vec::len).unwrap_or(0);
    let mut pooled = vec![0f32; width];
    for token in tokens {
        for (slot, value) in pooled.iter_mut().zip(token) {
            *slot += value;
        }
    }
    if !tokens.is_empty() {
        for slot in &mut pooled {
            *slot /= tokens.len() as f32;
        }
    }
    pooled
}
