use super::{
    format::DocumentFormat,
    traits::{Extraction, Extractor, IngestError},
};
use pdf::content::{Op, TextDrawAdjusted};
use pdf::file::FileOptions;
use tracing::{info, warn};

/// Extracts page text from PDF documents.
///
/// Each page that yields text becomes a `--- Page N ---` section (1-based).
/// Pages with no text, or whose content stream cannot be decoded, are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestError> {
        let file = FileOptions::cached()
            .load(bytes)
            .map_err(|e| IngestError::Extraction(format!("Failed to open PDF: {e}")))?;
        let resolver = file.resolver();

        let mut sections = Vec::new();
        for page_num in 0..file.num_pages() {
            let page = match file.get_page(page_num) {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping PDF page {}: {e}", page_num + 1);
                    continue;
                }
            };
            let Some(content) = &page.contents else {
                continue;
            };
            let operations = match content.operations(&resolver) {
                Ok(ops) => ops,
                Err(e) => {
                    warn!("Skipping PDF page {} with unreadable content: {e}", page_num + 1);
                    continue;
                }
            };

            let text = page_text(&operations);
            if text.trim().is_empty() {
                continue;
            }
            sections.push(format!("--- Page {} ---\n{}", page_num + 1, text.trim()));
        }

        info!(
            pages = file.num_pages(),
            kept = sections.len(),
            "Extracted text from PDF."
        );
        Ok(Extraction::new(DocumentFormat::Pdf, sections.join("\n\n")))
    }
}

// One draw operation is treated as one line of text.
fn page_text(operations: &[Op]) -> String {
    let mut lines = Vec::new();
    for op in operations {
        match op {
            Op::TextDraw { text } => lines.push(text.to_string_lossy().to_string()),
            Op::TextDrawAdjusted { array } => {
                let mut line = String::new();
                for item in array.iter() {
                    if let TextDrawAdjusted::Text(text) = item {
                        line.push_str(&text.to_string_lossy());
                    }
                }
                lines.push(line);
            }
            _ => {}
        }
    }
    lines
        .iter()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
