use crate::chain::QueryChain;
use crate::chunking::{split_text, ChunkingConfig};
use crate::config::PipelineConfig;
use crate::embeddings::Embedder;
use crate::error::{IngestError, QaError, ValidationError};
use crate::extractor::{extract_documents, LopdfExtractor};
use crate::index::{build_index, VectorIndex};
use crate::llm::LanguageModel;
use crate::models::{PdfUpload, ProcessReport};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Runs extract, chunk, index and chain construction for one document set.
pub struct Pipeline {
    config: PipelineConfig,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
    condense_questions: bool,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            config,
            embedder,
            model,
            condense_questions: true,
        }
    }

    pub fn with_question_condensing(mut self, enabled: bool) -> Self {
        self.condense_questions = enabled;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn process(
        &self,
        uploads: &[PdfUpload],
    ) -> Result<(QueryChain, ProcessReport), QaError> {
        if uploads.is_empty() {
            return Err(ValidationError::NoDocuments.into());
        }

        let chunking = ChunkingConfig::from(self.config);
        chunking.validate()?;

        let extraction = extract_documents(&LopdfExtractor, uploads)?;
        if extraction.text.trim().is_empty() {
            return Err(IngestError::EmptyText.into());
        }
        let text_chars = extraction.text.chars().count();

        let chunks = split_text(&extraction.text, chunking)?;
        let chunk_count = chunks.len();
        info!(
            documents = uploads.len(),
            text_chars,
            chunk_count,
            "document set split into chunks"
        );

        let index = build_index(chunks, self.embedder.as_ref(), self.config.embedding_batch_size).await?;
        let embedding_dimensions = index.dimensions();

        let chain = QueryChain::new(
            Arc::new(index),
            Arc::clone(&self.embedder),
            Arc::clone(&self.model),
            self.config.top_k,
        )
        .with_question_condensing(self.condense_questions);

        let report = ProcessReport {
            documents: extraction.documents,
            text_chars,
            chunk_count,
            embedding_dimensions,
            processed_at: Utc::now(),
        };

        Ok((chain, report))
    }
}
