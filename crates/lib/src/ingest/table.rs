//! Column-aligned plain-text rendering shared by the CSV and spreadsheet extractors.

/// Renders rows as a left-aligned table with two spaces between columns.
/// Short rows are padded; trailing whitespace is trimmed from every line.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    rows.iter()
        .map(|row| {
            let mut line = String::new();
            for (idx, width) in widths.iter().enumerate() {
                let cell = row.get(idx).map(String::as_str).unwrap_or("");
                let cell = flatten(cell);
                line.push_str(&cell);
                if idx + 1 < columns {
                    let pad = width.saturating_sub(display_width(&cell)) + 2;
                    line.extend(std::iter::repeat(' ').take(pad));
                }
            }
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Embedded newlines would break the row structure of the dump.
fn flatten(cell: &str) -> String {
    cell.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

fn display_width(cell: &str) -> usize {
    flatten(cell).chars().count()
}
