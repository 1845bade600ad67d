//! # Ingestion Pipeline Tests
//!
//! End-to-end checks of format detection, extraction, truncation, and the
//! context gate using real (generated) documents of every supported format.

mod common;

use anyhow::Result;
use promptdesk::{
    ingest::{self, ExtractOptions, TextEncodingPolicy},
    ContextAssembler, ContextError, DocumentFormat, IngestError, TokenBudget, Upload,
};
use promptdesk_test_utils::fixtures::{
    docx_with_paragraphs, pdf_with_pages, shift_jis, xlsx_with_sheets,
};

/// A Shift_JIS CSV fails the UTF-8 candidate, decodes on the second, and is
/// rendered with its row/column header.
#[test]
fn test_shift_jis_csv_decodes_on_second_candidate() -> Result<()> {
    common::setup_tracing();
    // --- Arrange ---
    let bytes = shift_jis("商品,数量\nりんご,3\nみかん,5\n");
    assert!(std::str::from_utf8(&bytes).is_err());

    // --- Act ---
    let extraction = ingest::extract("在庫.csv", &bytes, &ExtractOptions::default())?;

    // --- Assert ---
    assert_eq!(extraction.format, DocumentFormat::DelimitedText);
    assert_eq!(extraction.encoding, Some("shift_jis"));
    assert!(extraction.text.starts_with("Rows: 2, Columns: 2\n\n"));
    assert!(extraction.text.contains("りんご"));
    Ok(())
}

/// A 50-page PDF whose pages 10 and 11 carry no text yields exactly 48
/// numbered sections, and the empty pages' numbers never appear.
#[test]
fn test_pdf_skips_empty_pages() -> Result<()> {
    common::setup_tracing();
    // --- Arrange ---
    let texts: Vec<String> = (1..=50)
        .map(|n| {
            if n == 10 || n == 11 {
                String::new()
            } else {
                format!("Content of page {n}\nSecond line {n}")
            }
        })
        .collect();
    let pages: Vec<&str> = texts.iter().map(String::as_str).collect();
    let bytes = pdf_with_pages(&pages);

    // --- Act ---
    let extraction = ingest::extract("report.PDF", &bytes, &ExtractOptions::default())?;

    // --- Assert ---
    let text = &extraction.text;
    assert_eq!(text.matches("--- Page ").count(), 48);
    assert!(text.starts_with("--- Page 1 ---\nContent of page 1\nSecond line 1"));
    assert!(text.contains("--- Page 9 ---"));
    assert!(!text.contains("--- Page 10 ---"));
    assert!(!text.contains("--- Page 11 ---"));
    assert!(text.contains("Second line 9\n\n--- Page 12 ---"));
    assert!(text.ends_with("Second line 50"));
    Ok(())
}

/// A 100,000-character text cut to a 1000-token budget ends at the last line
/// break inside the final tenth of the 4000-character window.
#[test]
fn test_long_text_truncates_at_late_line_break() {
    // --- Arrange ---
    let line = format!("{}\n", "z".repeat(70));
    let text: String = line.repeat(100_000 / 71 + 1).chars().take(100_000).collect();
    let budget = TokenBudget::default();

    // --- Act ---
    let (out, truncated) = budget.truncate(&text, 1_000);

    // --- Assert ---
    assert!(truncated);
    assert!(out.chars().count() <= 4_000);
    // Newlines sit at 70 + 71k; the last one below 4000 is at index 3975.
    assert_eq!(out.chars().count(), 3_975);
    assert!(out.chars().count() * 10 >= 4_000 * 9);
    assert_eq!(text.chars().nth(3_975), Some('\n'));
    assert!(!out.ends_with('\n'));

    // Running it again changes nothing.
    let (again, truncated_again) = budget.truncate(&out, 1_000);
    assert_eq!(again, out);
    assert!(!truncated_again);
}

/// Uploads that together push the estimate past the hard cap are refused.
#[test]
fn test_oversized_context_is_refused() {
    // --- Arrange ---
    let assembler = ContextAssembler::default();
    // Two attachments at the 15k per-attachment cap plus a message: ~30k tokens.
    let uploads = vec![
        Upload::new("a.txt", "a".repeat(60_000).into_bytes()),
        Upload::new("b.txt", "b".repeat(60_000).into_bytes()),
    ];

    // --- Act ---
    let result = assembler.assemble("Compare these two files.", &uploads);

    // --- Assert ---
    match result {
        Err(ContextError::TooLarge { estimated, limit }) => {
            assert_eq!(limit, 25_000);
            assert!(estimated > 25_000);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

/// One attachment between the warn threshold and the hard cap proceeds with a warning.
#[test]
fn test_large_context_proceeds_with_warning() -> Result<()> {
    let budget = TokenBudget {
        per_attachment_tokens: 22_000,
        ..Default::default()
    };
    let assembler = ContextAssembler::new(budget, ExtractOptions::default());
    let uploads = vec![Upload::new("big.txt", "q".repeat(84_000).into_bytes())];

    let context = assembler.assemble("Summarize.", &uploads)?;

    let warning = context.warning.expect("a size warning");
    assert!(warning.estimated_tokens > 20_000 && warning.estimated_tokens <= 25_000);
    assert_eq!(warning.threshold, 20_000);
    Ok(())
}

#[test]
fn test_docx_paragraphs_and_empty_document() -> Result<()> {
    let bytes = docx_with_paragraphs(&["Agenda", "   ", "1. Budget & headcount", ""])?;
    let extraction = ingest::extract("minutes.docx", &bytes, &ExtractOptions::default())?;
    assert_eq!(extraction.text, "Agenda\n\n1. Budget & headcount");

    let blank = docx_with_paragraphs(&["", "  "])?;
    let err = ingest::extract("blank.docx", &blank, &ExtractOptions::default()).unwrap_err();
    assert_eq!(err, IngestError::EmptyExtraction);
    Ok(())
}

#[test]
fn test_docx_without_document_part_is_extraction_error() -> Result<()> {
    // A valid zip that is not a Word package.
    let bytes = xlsx_with_sheets(&[("Sheet1", vec![vec!["a"]])])?;
    let err = ingest::extract("fake.docx", &bytes, &ExtractOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::Extraction(_)));
    Ok(())
}

#[test]
fn test_xlsx_sheets_in_workbook_order() -> Result<()> {
    let bytes = xlsx_with_sheets(&[
        (
            "Sales",
            vec![vec!["name", "qty"], vec!["apple", "3"], vec!["fig", "12"]],
        ),
        ("Notes", vec![vec!["memo"], vec!["restock friday"]]),
    ])?;

    let extraction = ingest::extract("book.xlsx", &bytes, &ExtractOptions::default())?;

    assert_eq!(
        extraction.text,
        "=== Sheet: Sales ===\nRows: 2, Columns: 2\nname   qty\napple  3\nfig    12\n\n=== Sheet: Notes ===\nRows: 1, Columns: 1\nmemo\nrestock friday"
    );
    Ok(())
}

#[test]
fn test_plain_text_policies() {
    // Latin-1 bytes are neither UTF-8 nor Shift_JIS.
    let bytes = vec![0x43, 0x61, 0x66, 0xE9, 0x20, 0xFF];

    let permissive = ExtractOptions::default();
    let extraction = ingest::extract("menu.txt", &bytes, &permissive).unwrap();
    assert_eq!(extraction.encoding, Some("windows-1252"));
    assert_eq!(extraction.text, "Café ÿ");

    let strict = ExtractOptions {
        text_encoding: TextEncodingPolicy::Strict,
        ..Default::default()
    };
    let err = ingest::extract("menu.txt", &bytes, &strict).unwrap_err();
    assert!(matches!(err, IngestError::EncodingUndetermined(_)));
}

/// The async path runs on the blocking pool and produces the same blocks.
#[tokio::test]
async fn test_async_assembly_matches_sync() -> Result<()> {
    let assembler = ContextAssembler::default();
    let uploads = vec![
        Upload::new("notes.txt", b"line one\nline two".to_vec()),
        Upload::new("broken.pdf", b"%PDF-garbage".to_vec()),
    ];

    let sync = assembler.assemble("Read these.", &uploads)?;
    let async_ = assembler.assemble_async("Read these.", uploads).await?;

    assert_eq!(sync.text, async_.text);
    assert!(async_.text.contains("--- broken.pdf (error) ---"));
    assert_eq!(async_.attachment_infos()[1].kind, "error");
    Ok(())
}
