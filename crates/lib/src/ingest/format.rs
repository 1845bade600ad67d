use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The closed set of document formats the pipeline understands.
///
/// Detection looks only at the filename extension; content is never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentFormat {
    Pdf,
    Word,
    Spreadsheet,
    DelimitedText,
    PlainText,
}

impl DocumentFormat {
    /// Maps a filename to its format by case-insensitive extension.
    /// Unknown or missing extensions are treated as plain text.
    pub fn detect(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => DocumentFormat::Pdf,
            Some("docx") => DocumentFormat::Word,
            Some("xlsx") | Some("xls") => DocumentFormat::Spreadsheet,
            Some("csv") => DocumentFormat::DelimitedText,
            _ => DocumentFormat::PlainText,
        }
    }

    /// The stable tag used in API payloads and history records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Word => "word",
            DocumentFormat::Spreadsheet => "spreadsheet",
            DocumentFormat::DelimitedText => "delimited-text",
            DocumentFormat::PlainText => "plain-text",
        }
    }

    /// A human-readable label used in attachment headers.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Word => "Word",
            DocumentFormat::Spreadsheet => "Excel",
            DocumentFormat::DelimitedText => "CSV",
            DocumentFormat::PlainText => "Text",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
