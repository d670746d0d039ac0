use crate::chain::QueryChain;
use crate::error::{QaError, ValidationError};
use crate::models::{chat_messages, Answer, ChatMessage, ConversationTurn, PdfUpload, ProcessReport};
use crate::orchestrator::Pipeline;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-user state: the active chain (if any) and the last reply shown.
///
/// `Uninitialized` until a document set is processed; every later process
/// action swaps in a fresh chain, which also starts a fresh history.
pub struct Session {
    pipeline: Arc<Pipeline>,
    chain: Option<QueryChain>,
    latest_reply: Option<String>,
}

impl Session {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            chain: None,
            latest_reply: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.chain.is_some()
    }

    pub async fn process(&mut self, uploads: &[PdfUpload]) -> Result<ProcessReport, QaError> {
        match self.pipeline.process(uploads).await {
            Ok((chain, report)) => {
                if self.chain.replace(chain).is_some() {
                    info!("previous index and history replaced");
                }
                self.latest_reply = None;
                Ok(report)
            }
            Err(error) => {
                warn!(%error, "processing failed, keeping previous state");
                Err(error)
            }
        }
    }

    pub async fn ask(&mut self, question: &str) -> Result<Answer, QaError> {
        let chain = self.chain.as_mut().ok_or(ValidationError::NotProcessed)?;
        let answer = chain.answer(question).await?;
        self.latest_reply = Some(answer.answer.clone());
        Ok(answer)
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.chain.as_ref().map(QueryChain::history).unwrap_or_default()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        chat_messages(self.turns())
    }

    pub fn latest_reply(&self) -> Option<&str> {
        self.latest_reply.as_deref()
    }
}
