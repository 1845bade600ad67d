use super::format::DocumentFormat;
use serde::Serialize;
use thiserror::Error;

/// A uniform error type for every document extractor.
///
/// Each extractor maps its library-specific failures (zip, PDF, workbook
/// parsing) into these variants so callers can treat all formats alike.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Failed to extract content: {0}")]
    Extraction(String),

    #[error("Could not determine the text encoding (tried {0})")]
    EncodingUndetermined(String),

    #[error("No readable text content was found")]
    EmptyExtraction,

    #[error("Extraction timed out after {0} seconds")]
    Timeout(u64),
}

/// The text produced by a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub format: DocumentFormat,
    pub text: String,
    /// The winning candidate encoding, for text-based formats.
    pub encoding: Option<&'static str>,
}

impl Extraction {
    pub fn new(format: DocumentFormat, text: String) -> Self {
        Self {
            format,
            text,
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static str) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// The contract every format-specific extractor implements.
///
/// Extraction is CPU-bound and synchronous; async callers run it on the
/// blocking pool (see [`super::extract_with_timeout`]).
pub trait Extractor: Send + Sync {
    /// The format this extractor handles.
    fn format(&self) -> DocumentFormat;

    /// Converts the raw bytes of a document into plain text.
    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestError>;
}
