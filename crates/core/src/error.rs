use thiserror::Error;

/// Problems with what the user submitted. These never change session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload at least one PDF file.")]
    NoDocuments,

    #[error("Please enter a valid question.")]
    BlankQuestion,

    #[error("Please upload and process PDF files first.")]
    NotProcessed,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no text could be extracted from the uploaded documents")]
    EmptyText,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing credential: set {0} in the environment or .env file")]
    MissingCredential(&'static str),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("malformed response from {backend}: {details}")]
    MalformedResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("vector index error: {0}")]
    Index(String),
}

#[derive(Debug, Error)]
pub enum QaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Coarse classification used by callers that map errors onto a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Document,
    Service,
}

impl QaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QaError::Validation(_) => ErrorKind::Validation,
            QaError::Ingest(IngestError::Io(_)) => ErrorKind::Service,
            QaError::Ingest(_) => ErrorKind::Document,
            QaError::Service(_) => ErrorKind::Service,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

pub type Result<T, E = QaError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::NotProcessed.to_string(),
            "Please upload and process PDF files first."
        );
        assert_eq!(
            QaError::from(ValidationError::BlankQuestion).to_string(),
            "Please enter a valid question."
        );
    }

    #[test]
    fn errors_are_classified_by_origin() {
        let parse = QaError::from(IngestError::PdfParse("broken xref".to_string()));
        assert_eq!(parse.kind(), ErrorKind::Document);

        let missing = QaError::from(ServiceError::MissingCredential("HUGGINGFACE_API_KEY"));
        assert_eq!(missing.kind(), ErrorKind::Service);
        assert!(missing.to_string().contains("HUGGINGFACE_API_KEY"));

        assert!(QaError::from(ValidationError::NoDocuments).is_validation());
    }
}
