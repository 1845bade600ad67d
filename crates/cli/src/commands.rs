//! # Command Handlers
//!
//! Each subcommand's work lives here, free of argument parsing and writing to
//! a caller-supplied sink so it can be driven from tests.

use anyhow::{Context, Result};
use promptdesk::{
    ingest,
    prompts::{author_prompts, export_prompts, PromptExport},
    providers::ai::AiProvider,
    ChatOrchestrator, ChatSession, ContextAssembler, ExtractOptions, PromptCatalog,
    PromptTemplate, StreamEvent, StreamReport, TokenBudget, Upload,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::info;

/// Where `generate` gets its templates from.
pub enum TemplateSource<'a> {
    /// Draw from the category's file in the catalog.
    Sample,
    /// Ask the model to write new ones for a theme.
    Author {
        provider: &'a dyn AiProvider,
        theme: &'a str,
    },
}

pub fn write_categories(catalog: &PromptCatalog, out: &mut impl Write) -> Result<()> {
    for category in catalog.list_categories() {
        let marker = if catalog.root().join(&category.file).exists() {
            ""
        } else {
            "  (no file)"
        };
        writeln!(out, "{:<16} {}{}", category.key, category.name, marker)?;
    }
    Ok(())
}

pub async fn collect_templates(
    catalog: &PromptCatalog,
    category: &str,
    count: usize,
    source: TemplateSource<'_>,
) -> Result<Vec<PromptTemplate>> {
    let prompts = match source {
        TemplateSource::Sample => catalog.sample(category, count)?,
        TemplateSource::Author { provider, theme } => {
            author_prompts(provider, theme, count, Some(category)).await?
        }
    };
    info!(category, count = prompts.len(), "Collected prompt templates.");
    Ok(prompts)
}

/// Writes the export to `output` when given, otherwise to a timestamped file
/// under `output_dir`.
pub fn write_export(
    output: Option<&Path>,
    output_dir: &Path,
    category: &str,
    prompts: Vec<PromptTemplate>,
) -> Result<PathBuf> {
    let Some(path) = output else {
        return Ok(export_prompts(output_dir, category, prompts)?);
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let export = PromptExport {
        category: category.to_string(),
        generated_count: prompts.len(),
        prompts,
    };
    std::fs::write(path, serde_json::to_string_pretty(&export)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

pub fn display_templates(prompts: &[PromptTemplate], out: &mut impl Write) -> Result<()> {
    for prompt in prompts {
        writeln!(out, "[{}] {}", prompt.id, prompt.title)?;
        for line in prompt.system_prompt.lines() {
            writeln!(out, "    {line}")?;
        }
        if !prompt.recommended_attachments.is_empty() {
            writeln!(
                out,
                "    Attachments: {}",
                prompt.recommended_attachments.join(", ")
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Extracts one file, bounds it to the per-attachment budget, and prints a
/// summary line followed by the text.
pub fn extract_file(
    path: &Path,
    options: &ExtractOptions,
    budget: &TokenBudget,
    out: &mut impl Write,
) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = file_name(path);
    let extraction = ingest::extract(&name, &bytes, options)?;
    let (text, truncated) = budget.truncate_attachment(&extraction.text);

    writeln!(
        out,
        "{name}: {} | encoding: {} | {} chars (~{} tokens){}",
        extraction.format.label(),
        extraction.encoding.unwrap_or("n/a"),
        extraction.text.chars().count(),
        budget.estimate(&extraction.text),
        if truncated { " | truncated" } else { "" }
    )?;
    writeln!(out)?;
    writeln!(out, "{text}")?;
    Ok(())
}

/// Reads every path into an [`Upload`] named by its file name.
pub fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Upload::new(file_name(path), bytes))
        })
        .collect()
}

/// Composes the user turn and writes the reply to `out` as it streams.
///
/// An oversized context is returned as an error before anything is written.
pub async fn stream_chat(
    orchestrator: &ChatOrchestrator,
    assembler: &ContextAssembler,
    session: &mut ChatSession,
    message: &str,
    uploads: Vec<Upload>,
    out: &mut impl Write,
) -> Result<StreamReport> {
    let (tx, mut rx) = mpsc::channel(64);

    let producer = async {
        let tx = tx;
        orchestrator
            .compose_reply(assembler, session, message, uploads, &tx)
            .await
    };
    let consumer = async {
        while let Some(event) = rx.recv().await {
            render_event(&event, out)?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (report, rendered) = tokio::join!(producer, consumer);
    rendered?;
    Ok(report?)
}

fn render_event(event: &StreamEvent, out: &mut impl Write) -> std::io::Result<()> {
    match event {
        StreamEvent::Delta { content } => {
            write!(out, "{content}")?;
            out.flush()
        }
        StreamEvent::Warning { message, .. } => writeln!(out, "⚠️  {message}\n"),
        StreamEvent::Error { message } => writeln!(out, "\n❌ {message}"),
        StreamEvent::Done => writeln!(out),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
