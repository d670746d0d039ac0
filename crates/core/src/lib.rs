pub mod chain;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
mod hub;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod testing;

pub use chain::QueryChain;
pub use chunking::{split_text, ChunkingConfig};
pub use config::{InferenceConfig, PipelineConfig, API_KEY_ENV};
pub use embeddings::{CharacterNgramEmbedder, Embedder, HuggingFaceEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ErrorKind, IngestError, QaError, ServiceError, ValidationError};
pub use extractor::{extract_documents, extract_page_texts, extract_text, LopdfExtractor, PageText, PdfExtractor};
pub use index::{build_index, InMemoryIndex, VectorIndex};
pub use ingest::{collect_uploads, discover_pdf_files, load_pdf_upload};
pub use llm::{HuggingFaceHub, LanguageModel};
pub use models::{
    Answer, ChatMessage, ConversationTurn, DocumentSummary, PdfUpload, ProcessReport, Role,
    ScoredChunk,
};
pub use orchestrator::Pipeline;
pub use session::Session;
