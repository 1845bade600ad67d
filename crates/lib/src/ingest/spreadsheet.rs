use super::{
    format::DocumentFormat,
    table::render_table,
    traits::{Extraction, Extractor, IngestError},
};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::{info, warn};

/// Extracts every worksheet of an .xlsx/.xls workbook as an aligned text dump.
///
/// The first row of each sheet is treated as its header, so the reported row
/// count covers data rows only. No row or column limit is applied here; the
/// per-attachment token budget bounds the result downstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpreadsheetExtractor;

impl Extractor for SpreadsheetExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Spreadsheet
    }

    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| IngestError::Extraction(format!("Failed to open workbook: {e}")))?;

        let mut sections = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                IngestError::Extraction(format!("Failed to read sheet '{name}': {e}"))
            })?;
            if range.is_empty() {
                warn!(sheet = %name, "Worksheet is empty.");
            }
            sections.push(render_sheet(&name, &range));
        }

        info!(sheets = sections.len(), "Extracted text from workbook.");
        Ok(Extraction::new(
            DocumentFormat::Spreadsheet,
            sections.join("\n\n"),
        ))
    }
}

fn render_sheet(name: &str, range: &Range<Data>) -> String {
    let (height, width) = range.get_size();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    let mut out = format!(
        "=== Sheet: {name} ===\nRows: {}, Columns: {width}",
        height.saturating_sub(1)
    );
    if !rows.is_empty() {
        out.push('\n');
        out.push_str(&render_table(&rows));
    }
    out
}
