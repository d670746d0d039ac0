use crate::embeddings::Embedder;
use crate::error::{QaError, ServiceError};
use crate::models::ScoredChunk;
use std::time::Instant;
use tracing::info;

pub trait VectorIndex: Send + Sync {
    fn dimensions(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, ServiceError>;
}

#[derive(Debug, Clone)]
struct IndexEntry {
    embedding: Vec<f32>,
    text: String,
}

/// Exact cosine-similarity index held entirely in memory. Immutable once built.
#[derive(Debug, Clone)]
pub struct InMemoryIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl InMemoryIndex {
    pub fn from_embeddings(
        chunks: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, ServiceError> {
        if chunks.is_empty() {
            return Err(ServiceError::Index("cannot build an index from zero chunks".to_string()));
        }

        if chunks.len() != embeddings.len() {
            return Err(ServiceError::Index(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(ServiceError::Index("embeddings have zero dimensions".to_string()));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| {
                if embedding.len() != dimensions {
                    return Err(ServiceError::Index(format!(
                        "embedding dimension {} != {}",
                        embedding.len(),
                        dimensions
                    )));
                }
                Ok(IndexEntry { embedding, text })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        Ok(Self {
            dimensions,
            entries,
        })
    }
}

impl VectorIndex for InMemoryIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, ServiceError> {
        if query_vector.len() != self.dimensions {
            return Err(ServiceError::Index(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.dimensions
            )));
        }

        let mut scored = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| ScoredChunk {
                position,
                text: entry.text.clone(),
                score: cosine_similarity(&entry.embedding, query_vector),
            })
            .collect::<Vec<_>>();

        // stable sort keeps document order among equal scores
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embeds every chunk in sequential batches and builds the index.
pub async fn build_index(
    chunks: Vec<String>,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<InMemoryIndex, QaError> {
    if chunks.is_empty() {
        return Err(ServiceError::Index("cannot build an index from zero chunks".to_string()).into());
    }

    let started = Instant::now();
    let mut embeddings = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let vectors = embedder.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(ServiceError::Index(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            ))
            .into());
        }
        embeddings.extend(vectors);
    }

    let index = InMemoryIndex::from_embeddings(chunks, embeddings)?;
    info!(
        chunk_count = index.len(),
        dimensions = index.dimensions(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "vector index built"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::testing::CountingEmbedder;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn search_ranks_by_cosine_and_truncates() {
        let index = InMemoryIndex::from_embeddings(
            texts(&["east", "north", "north-east"]),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();

        let hits = index.search(&[0.0, 2.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "north");
        assert_eq!(hits[1].text, "north-east");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn equal_scores_keep_document_order() {
        let index = InMemoryIndex::from_embeddings(
            texts(&["first", "second"]),
            vec![vec![1.0, 0.0], vec![1.0, 0.0]],
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 4).unwrap();
        assert_eq!(hits.iter().map(|hit| hit.position).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        assert!(InMemoryIndex::from_embeddings(Vec::new(), Vec::new()).is_err());
        assert!(InMemoryIndex::from_embeddings(texts(&["a"]), Vec::new()).is_err());
        assert!(InMemoryIndex::from_embeddings(
            texts(&["a", "b"]),
            vec![vec![1.0, 0.0], vec![1.0]]
        )
        .is_err());

        let index = InMemoryIndex::from_embeddings(texts(&["a"]), vec![vec![1.0, 0.0]]).unwrap();
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn build_index_embeds_in_batches() {
        let embedder = CountingEmbedder::default();
        let chunks = texts(&["a", "b", "c", "d", "e"]);
        let index = build_index(chunks, &embedder, 2).await.unwrap();

        assert_eq!(index.len(), 5);
        assert_eq!(embedder.batches(), 3);
    }

    #[tokio::test]
    async fn build_index_rejects_empty_chunks() {
        let embedder = CharacterNgramEmbedder::default();
        let error = build_index(Vec::new(), &embedder, 8).await.unwrap_err();
        assert!(matches!(error, QaError::Service(ServiceError::Index(_))));
    }
}
