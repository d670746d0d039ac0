mod server;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pdf_qa_core::config::{DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL, DEFAULT_INFERENCE_URL};
use pdf_qa_core::{
    collect_uploads, CharacterNgramEmbedder, Embedder, HuggingFaceEmbedder, HuggingFaceHub,
    InferenceConfig, LanguageModel, PdfUpload, Pipeline, PipelineConfig, Session,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Hugging Face Inference API token
    #[arg(long, env = "HUGGINGFACE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Inference API base URL
    #[arg(long, default_value = DEFAULT_INFERENCE_URL, global = true)]
    inference_url: String,

    /// Model used to generate answers
    #[arg(long, default_value = DEFAULT_GENERATION_MODEL, global = true)]
    generation_model: String,

    /// Model used for hosted sentence embeddings
    #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL, global = true)]
    embedding_model: String,

    /// Where chunk and question embeddings come from
    #[arg(long, value_enum, default_value_t = EmbedderKind::HuggingFace, global = true)]
    embedder: EmbedderKind,

    /// Maximum characters per chunk
    #[arg(long, default_value = "1000", global = true)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value = "20", global = true)]
    chunk_overlap: usize,

    /// Chunks retrieved per question
    #[arg(long, default_value = "4", global = true)]
    top_k: usize,

    /// Use follow-up questions as-is instead of rewriting them with the history
    #[arg(long, default_value_t = false, global = true)]
    no_condense: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmbedderKind {
    /// Offline hashed character trigrams
    Hashed,
    /// sentence-transformers through the Inference API
    HuggingFace,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the upload and chat UI.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8501")]
        bind: SocketAddr,
        /// Largest accepted upload request in bytes.
        #[arg(long, default_value = "52428800")]
        max_upload_bytes: usize,
        /// Seconds a session may sit idle before its index is dropped.
        #[arg(long, default_value = "3600")]
        session_ttl_secs: u64,
    },
    /// Process PDFs once and answer questions about them in one conversation.
    Ask {
        /// PDF file to include; repeatable.
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,
        /// Folder searched recursively for PDFs; repeatable.
        #[arg(long)]
        folder: Vec<PathBuf>,
        /// Question to ask, in order; repeatable.
        #[arg(long = "question", required = true)]
        questions: Vec<String>,
    },
}

impl Cli {
    fn inference_config(&self) -> InferenceConfig {
        let from_env = InferenceConfig::from_env();
        let api_key = self.api_key.clone().or_else(|| from_env.api_key.clone());

        InferenceConfig {
            base_url: self.inference_url.clone(),
            generation_model: self.generation_model.clone(),
            embedding_model: self.embedding_model.clone(),
            ..from_env
        }
        .with_api_key(api_key)
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            top_k: self.top_k,
            ..PipelineConfig::default()
        }
    }

    fn build_pipeline(&self) -> anyhow::Result<Pipeline> {
        let inference = self.inference_config();

        let model: Arc<dyn LanguageModel> = Arc::new(
            HuggingFaceHub::new(&inference).context("cannot configure the language model")?,
        );
        let embedder: Arc<dyn Embedder> = match self.embedder {
            EmbedderKind::Hashed => Arc::new(CharacterNgramEmbedder::default()),
            EmbedderKind::HuggingFace => Arc::new(
                HuggingFaceEmbedder::new(&inference).context("cannot configure the embedder")?,
            ),
        };

        info!(
            generation_model = %inference.generation_model,
            embedder = ?self.embedder,
            dimensions = embedder.dimensions(),
            "inference configured"
        );

        Ok(Pipeline::new(self.pipeline_config(), embedder, model)
            .with_question_condensing(!self.no_condense))
    }
}

fn load_uploads(pdfs: &[PathBuf], folders: &[PathBuf]) -> anyhow::Result<Vec<PdfUpload>> {
    collect_uploads(pdfs, folders).context("cannot load PDFs")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            eprintln!("ignoring unreadable .env file: {error}");
        }
    }

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa boot"
    );

    let pipeline = cli.build_pipeline()?;

    match cli.command {
        Command::Serve {
            bind,
            max_upload_bytes,
            session_ttl_secs,
        } => {
            let state = server::AppState::new(pipeline)
                .with_session_ttl(Duration::from_secs(session_ttl_secs));
            server::serve(state, bind, max_upload_bytes).await?;
        }
        Command::Ask {
            pdfs,
            folder,
            questions,
        } => {
            let uploads = load_uploads(&pdfs, &folder)?;

            let mut session = Session::new(Arc::new(pipeline));
            let report = session.process(&uploads).await?;
            for document in &report.documents {
                println!(
                    "processed {} ({} pages, {} bytes, sha256 {})",
                    document.file_name, document.page_count, document.size_bytes, document.checksum
                );
            }
            println!(
                "{} chunks from {} characters at {}",
                report.chunk_count,
                report.text_chars,
                report.processed_at.to_rfc3339()
            );

            let mut failures = 0usize;
            for question in questions {
                println!("\nUser: {question}");
                match session.ask(&question).await {
                    Ok(answer) => println!("Reply: {}", answer.answer),
                    Err(error) => {
                        failures += 1;
                        warn!(%error, "question failed");
                        eprintln!("error: {error}");
                    }
                }
            }

            println!("\n{} turn(s) in history", session.turns().len());
            if failures > 0 {
                anyhow::bail!("{failures} question(s) could not be answered");
            }
        }
    }

    Ok(())
}
