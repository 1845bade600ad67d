use super::{
    encoding::{EncodingProbe, TextEncodingPolicy},
    format::DocumentFormat,
    traits::{Extraction, Extractor, IngestError},
};

/// Decodes plain text with the probe list selected by the encoding policy.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    probe: EncodingProbe,
}

impl TextExtractor {
    pub fn new(policy: TextEncodingPolicy) -> Self {
        Self {
            probe: policy.probe(),
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(TextEncodingPolicy::default())
    }
}

impl Extractor for TextExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::PlainText
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestError> {
        let (text, encoding) = self.probe.probe(bytes, |text| Some(text.to_string()))?;
        Ok(Extraction::new(DocumentFormat::PlainText, text).with_encoding(encoding))
    }
}
