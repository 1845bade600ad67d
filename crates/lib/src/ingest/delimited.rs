use super::{
    encoding::{EncodingProbe, STRICT_CANDIDATES},
    format::DocumentFormat,
    table::render_table,
    traits::{Extraction, Extractor, IngestError},
};
use tracing::{debug, info};

/// Extracts delimited text, probing encodings until one both decodes and
/// parses as CSV no wider than its header row. Short rows are padded.
///
/// The probe list never ends in a universal single-byte fallback, so a file
/// that is neither UTF-8 nor Shift_JIS fails with `EncodingUndetermined`
/// rather than yielding mojibake.
#[derive(Debug, Clone)]
pub struct CsvExtractor {
    probe: EncodingProbe,
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self {
            probe: EncodingProbe::new(STRICT_CANDIDATES),
        }
    }
}

impl Extractor for CsvExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::DelimitedText
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestError> {
        let (rows, encoding) = self.probe.probe(bytes, parse_rows)?;

        let Some(header) = rows.first() else {
            return Err(IngestError::EmptyExtraction);
        };
        let columns = header.len();
        let data_rows = rows.len() - 1;

        info!(encoding, rows = data_rows, columns, "Parsed CSV.");
        let text = format!(
            "Rows: {data_rows}, Columns: {columns}\n\n{}",
            render_table(&rows)
        );
        Ok(Extraction::new(DocumentFormat::DelimitedText, text).with_encoding(encoding))
    }
}

// Rejects the candidate when any record is malformed or wider than the header.
fn parse_rows(text: &str) -> Option<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("CSV parse failed under candidate encoding: {e}");
                return None;
            }
        };
        if let Some(header) = rows.first() {
            if record.len() > header.len() {
                debug!(
                    row = rows.len(),
                    fields = record.len(),
                    columns = header.len(),
                    "CSV row is wider than its header."
                );
                return None;
            }
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_csv_header_counts() {
        let csv = "name,qty\napple,3\nfig,12\n";
        let extraction = CsvExtractor::default().extract(csv.as_bytes()).unwrap();
        assert_eq!(extraction.encoding, Some("utf-8"));
        assert!(extraction.text.starts_with("Rows: 2, Columns: 2\n\n"));
        assert!(extraction.text.contains("apple  3"));
    }

    #[test]
    fn test_short_rows_are_padded_to_header_width() {
        let csv = "name,qty,note\napple,3\nfig,12,ripe\n";
        let extraction = CsvExtractor::default().extract(csv.as_bytes()).unwrap();
        assert_eq!(extraction.encoding, Some("utf-8"));
        assert_eq!(
            extraction.text,
            "Rows: 2, Columns: 3\n\nname   qty  note\napple  3\nfig    12   ripe"
        );
    }

    #[test]
    fn test_rows_wider_than_header_reject_every_candidate() {
        let csv = "a,b\n1,2,3\n";
        let err = CsvExtractor::default().extract(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::EncodingUndetermined(_)));
    }

    #[test]
    fn test_empty_file_has_no_header() {
        let err = CsvExtractor::default().extract(b"").unwrap_err();
        assert_eq!(err, IngestError::EmptyExtraction);
    }
}
