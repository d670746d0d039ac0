use crate::error::IngestError;
use crate::models::{DocumentSummary, PdfUpload};
use lopdf::Document;
use sha2::{Digest, Sha256};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    fn extract_pages(&self, upload: &PdfUpload) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, upload: &PdfUpload) -> Result<Vec<PageText>, IngestError> {
        let document = Document::load_mem(&upload.bytes).map_err(|error| {
            IngestError::PdfParse(format!("{}: {error}", upload.file_name))
        })?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document.extract_text(&[page_no]).map_err(|error| {
                IngestError::PdfParse(format!(
                    "{} page {page_no}: {error}",
                    upload.file_name
                ))
            })?;

            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}

pub fn extract_page_texts(upload: &PdfUpload) -> Result<Vec<PageText>, IngestError> {
    LopdfExtractor.extract_pages(upload)
}

/// Text of a whole document set plus a summary of each document.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub documents: Vec<DocumentSummary>,
}

pub fn extract_documents<E: PdfExtractor>(
    extractor: &E,
    uploads: &[PdfUpload],
) -> Result<Extraction, IngestError> {
    let mut text = String::new();
    let mut documents = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let pages = extractor.extract_pages(upload)?;
        for page in &pages {
            text.push_str(&page.text);
        }

        debug!(file = %upload.file_name, pages = pages.len(), "extracted pdf text");
        documents.push(DocumentSummary {
            file_name: upload.file_name.clone(),
            size_bytes: upload.bytes.len() as u64,
            page_count: pages.len() as u32,
            checksum: digest_bytes(&upload.bytes),
        });
    }

    Ok(Extraction { text, documents })
}

/// Concatenates the text of every page of every upload, in upload order.
pub fn extract_text(uploads: &[PdfUpload]) -> Result<String, IngestError> {
    extract_documents(&LopdfExtractor, uploads).map(|extraction| extraction.text)
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
