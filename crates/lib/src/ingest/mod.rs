//! # Document Ingestion
//!
//! Turns uploaded bytes into plain text. The filename selects a
//! [`DocumentFormat`]; each format owns exactly one [`Extractor`]. Extraction
//! is synchronous and CPU-bound, so async callers go through
//! [`extract_with_timeout`], which runs it on the blocking pool.

pub mod encoding;
pub mod format;
pub mod table;
pub mod traits;

#[cfg(feature = "sheets")]
pub mod delimited;
#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "sheets")]
pub mod spreadsheet;
pub mod text;
#[cfg(feature = "word")]
pub mod word;

pub use encoding::{EncodingProbe, TextEncodingPolicy};
pub use format::DocumentFormat;
pub use traits::{Extraction, Extractor, IngestError};

use std::time::Duration;
use tracing::{info, instrument};

/// Options that shape extraction independent of the document itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub text_encoding: TextEncodingPolicy,
    /// Upper bound on a single extraction when run asynchronously.
    pub timeout: Option<Duration>,
}

/// Returns the extractor that owns `format`.
pub fn extractor_for(
    format: DocumentFormat,
    options: &ExtractOptions,
) -> Result<Box<dyn Extractor>, IngestError> {
    let extractor: Box<dyn Extractor> = match format {
        #[cfg(feature = "pdf")]
        DocumentFormat::Pdf => Box::new(pdf::PdfExtractor),
        #[cfg(feature = "word")]
        DocumentFormat::Word => Box::new(word::WordExtractor),
        #[cfg(feature = "sheets")]
        DocumentFormat::Spreadsheet => Box::new(spreadsheet::SpreadsheetExtractor),
        #[cfg(feature = "sheets")]
        DocumentFormat::DelimitedText => Box::new(delimited::CsvExtractor::default()),
        DocumentFormat::PlainText => Box::new(text::TextExtractor::new(options.text_encoding)),
        #[allow(unreachable_patterns)]
        other => {
            return Err(IngestError::Extraction(format!(
                "Support for {} documents is not enabled in this build",
                other.label()
            )))
        }
    };
    Ok(extractor)
}

/// Detects the format from `filename` and extracts synchronously.
pub fn extract(
    filename: &str,
    bytes: &[u8],
    options: &ExtractOptions,
) -> Result<Extraction, IngestError> {
    let format = DocumentFormat::detect(filename);
    extractor_for(format, options)?.extract(bytes)
}

/// Runs [`extract`] on the blocking pool, bounded by `options.timeout`.
///
/// On timeout the blocking task is left to finish on its own; its result is
/// discarded.
#[instrument(skip(bytes, options), fields(size = bytes.len()))]
pub async fn extract_with_timeout(
    filename: &str,
    bytes: Vec<u8>,
    options: &ExtractOptions,
) -> Result<Extraction, IngestError> {
    let name = filename.to_string();
    let opts = *options;
    let task = tokio::task::spawn_blocking(move || extract(&name, &bytes, &opts));

    let joined = match options.timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| IngestError::Timeout(limit.as_secs()))?,
        None => task.await,
    };

    let extraction = joined.map_err(|e| {
        IngestError::Extraction(format!("Extraction task failed to complete: {e}"))
    })??;
    info!(
        format = %extraction.format,
        chars = extraction.text.chars().count(),
        "Extraction finished."
    );
    Ok(extraction)
}
