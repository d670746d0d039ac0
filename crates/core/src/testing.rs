//! Test doubles shared by the unit tests of this crate.

use crate::embeddings::{CharacterNgramEmbedder, Embedder};
use crate::error::ServiceError;
use crate::llm::LanguageModel;
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Builds a PDF with one page per entry of `pages`, each holding one line of text.
pub(crate) fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("content stream should encode");
        let content_id = document.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    document.save_to(&mut bytes).expect("pdf should serialize");
    bytes
}

pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
    pdf_with_pages(&[text])
}

/// Hashed embedder that counts how often it is asked for vectors.
#[derive(Default)]
pub(crate) struct CountingEmbedder {
    inner: CharacterNgramEmbedder,
    batches: AtomicUsize,
}

impl CountingEmbedder {
    pub(crate) fn calls(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub(crate) fn batches(&self) -> usize {
        self.calls()
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

enum Script {
    EchoContext,
    Fail,
}

/// Language model stand-in. `echo_context` answers with the first retrieved
/// passage and rewrites follow-ups to themselves.
pub(crate) struct ScriptedModel {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub(crate) fn echo_context() -> Self {
        Self {
            script: Script::EchoContext,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            script: Script::Fail,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().expect("prompt log poisoned").len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());

        match self.script {
            Script::Fail => Err(ServiceError::BackendResponse {
                backend: "scripted".to_string(),
                details: "503 Service Unavailable".to_string(),
            }),
            Script::EchoContext if prompt.ends_with("Standalone question:") => Ok(prompt
                .split("Follow Up Input: ")
                .nth(1)
                .and_then(|rest| rest.lines().next())
                .unwrap_or_default()
                .to_string()),
            Script::EchoContext => {
                let context = prompt.split("\n\n").nth(1).unwrap_or_default().trim();
                if context.is_empty() {
                    Ok("I don't know.".to_string())
                } else {
                    Ok(context.to_string())
                }
            }
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
