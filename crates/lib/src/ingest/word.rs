//! Word (.docx) extraction.
//!
//! A .docx file is a zip container; the body lives in `word/document.xml`.
//! Paragraphs (`<w:p>`) are walked in document order and their text runs
//! (`<w:t>`) concatenated, with tabs and breaks preserved.

use super::{
    format::DocumentFormat,
    traits::{Extraction, Extractor, IngestError},
};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use tracing::info;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:p(?:\s[^>]*[^/>])?>(.*?)</w:p>").expect("valid regex"))
}

fn run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>")
            .expect("valid regex")
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WordExtractor;

impl Extractor for WordExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Word
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| IngestError::Extraction(format!("Not a valid .docx container: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| IngestError::Extraction(format!("Missing {DOCUMENT_PART}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| IngestError::Extraction(format!("Failed to read {DOCUMENT_PART}: {e}")))?;

        let paragraphs = paragraphs_from_xml(&xml);
        if paragraphs.is_empty() {
            return Err(IngestError::EmptyExtraction);
        }

        info!(paragraphs = paragraphs.len(), "Extracted text from Word document.");
        Ok(Extraction::new(DocumentFormat::Word, paragraphs.join("\n\n")))
    }
}

/// Returns the non-empty paragraphs of a WordprocessingML body in order.
pub(crate) fn paragraphs_from_xml(xml: &str) -> Vec<String> {
    paragraph_re()
        .captures_iter(xml)
        .filter_map(|caps| {
            let inner = caps.get(1)?.as_str();
            let mut text = String::new();
            for run in run_re().captures_iter(inner) {
                match run.get(1) {
                    Some(t) => text.push_str(&decode_entities(t.as_str())),
                    None if run[0].starts_with("<w:tab") => text.push('\t'),
                    None => text.push('\n'),
                }
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ if entity.starts_with('#') => entity[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
