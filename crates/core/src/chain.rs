use crate::embeddings::Embedder;
use crate::error::{QaError, ValidationError};
use crate::index::VectorIndex;
use crate::llm::LanguageModel;
use crate::models::{Answer, ConversationTurn, ScoredChunk};
use crate::prompt::PromptBuilder;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Conversational retrieval chain over one immutable index.
///
/// History only grows, and only after the model has produced an answer, so a
/// failed call leaves the chain exactly as it was.
pub struct QueryChain {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
    top_k: usize,
    condense_questions: bool,
    history: Vec<ConversationTurn>,
}

impl QueryChain {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            model,
            top_k: top_k.max(1),
            condense_questions: true,
            history: Vec::new(),
        }
    }

    pub fn with_question_condensing(mut self, enabled: bool) -> Self {
        self.condense_questions = enabled;
        self
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, QaError> {
        let query_vector = self.embedder.embed(query).await?;
        Ok(self.index.search(&query_vector, self.top_k)?)
    }

    pub async fn answer(&mut self, question: &str) -> Result<Answer, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::BlankQuestion.into());
        }

        let started = Instant::now();
        let retrieval_query = self.standalone_question(question).await?;
        let chunks = self.retrieve(&retrieval_query).await?;
        debug!(
            retrieved = chunks.len(),
            top_score = chunks.first().map(|chunk| chunk.score),
            "retrieved context"
        );

        let prompt = PromptBuilder::build_answer_prompt(&chunks, &self.history, question);
        let answer = self.model.generate(&prompt).await?;

        self.history.push(ConversationTurn {
            question: question.to_string(),
            answer: answer.clone(),
            answered_at: Utc::now(),
        });

        info!(
            model = self.model.model(),
            turns = self.history.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "question answered"
        );

        Ok(Answer {
            answer,
            history: self.history.clone(),
        })
    }

    async fn standalone_question(&self, question: &str) -> Result<String, QaError> {
        if !self.condense_questions || self.history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = PromptBuilder::build_condense_prompt(&self.history, question);
        let condensed = self.model.generate(&prompt).await?;
        debug!(original = question, condensed = %condensed, "condensed follow-up question");
        Ok(condensed)
    }
}
