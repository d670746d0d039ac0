//! Prompt templates for the question-answering chain.

use crate::models::{ConversationTurn, ScoredChunk};

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn format_history(history: &[ConversationTurn]) -> String {
        history
            .iter()
            .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|chunk| chunk.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Asks the model to turn a follow-up into a question that stands on its own.
    pub fn build_condense_prompt(history: &[ConversationTurn], question: &str) -> String {
        format!(
            "Given the following conversation and a follow up question, rephrase the follow up \
             question to be a standalone question, in its original language.\n\n\
             Chat History:\n{history}\n\
             Follow Up Input: {question}\n\
             Standalone question:",
            history = Self::format_history(history),
        )
    }

    pub fn build_answer_prompt(
        chunks: &[ScoredChunk],
        history: &[ConversationTurn],
        question: &str,
    ) -> String {
        let conversation = if history.is_empty() {
            String::new()
        } else {
            format!("Conversation so far:\n{}\n\n", Self::format_history(history))
        };

        format!(
            "Use the following pieces of context to answer the question at the end. If you \
             don't know the answer, just say that you don't know, don't try to make up an \
             answer.\n\n\
             {context}\n\n\
             {conversation}\
             Question: {question}\n\
             Helpful Answer:",
            context = Self::build_context(chunks),
        )
    }
}
