//! # Context Assembly
//!
//! Combines the user's typed message with every uploaded file into one bounded
//! prompt. Each upload is extracted and truncated to the per-attachment budget;
//! a failed extraction becomes an inline error block instead of failing the
//! request. The assembled text is then gated on its aggregate token estimate.

use crate::{
    budget::{BudgetLevel, TokenBudget},
    chat::message::AttachmentInfo,
    errors::ContextError,
    ingest::{self, DocumentFormat, ExtractOptions, Extraction, IngestError},
};
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Raw bytes of one uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// One upload after extraction and truncation.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub name: String,
    /// Size of the upload in bytes.
    pub size: u64,
    pub format: DocumentFormat,
    pub text: String,
    pub truncated: bool,
    pub error: Option<String>,
    /// Character length of the extracted text before truncation.
    pub original_chars: usize,
    pub encoding: Option<&'static str>,
}

impl Attachment {
    /// Builds the attachment record from an extraction result.
    pub fn from_extraction(
        name: &str,
        size: u64,
        result: Result<Extraction, IngestError>,
        budget: &TokenBudget,
    ) -> Self {
        let format = DocumentFormat::detect(name);
        match result {
            Ok(extraction) => {
                let original_chars = extraction.text.chars().count();
                let (text, truncated) = budget.truncate_attachment(&extraction.text);
                if truncated {
                    info!(
                        file = name,
                        original_chars,
                        kept_chars = text.chars().count(),
                        "Attachment truncated to the per-attachment budget."
                    );
                }
                Self {
                    name: name.to_string(),
                    size,
                    format: extraction.format,
                    text,
                    truncated,
                    error: None,
                    original_chars,
                    encoding: extraction.encoding,
                }
            }
            Err(e) => {
                warn!(file = name, "Attachment could not be read: {e}");
                Self {
                    name: name.to_string(),
                    size,
                    format,
                    text: String::new(),
                    truncated: false,
                    error: Some(e.to_string()),
                    original_chars: 0,
                    encoding: None,
                }
            }
        }
    }

    /// The annotated block inserted into the prompt.
    pub fn render_block(&self, budget: &TokenBudget) -> String {
        match &self.error {
            Some(error) => format!(
                "--- {} (error) ---\n[This file could not be read: {error}]",
                self.name
            ),
            None => {
                let mut block = format!("--- {} ({}) ---\n", self.name, self.format.label());
                if self.truncated {
                    block.push_str(&format!(
                        "[Note: this file is large and was truncated to about {} tokens (original ~{} tokens).]\n",
                        budget.per_attachment_tokens,
                        self.original_chars / budget.chars_per_token.max(1)
                    ));
                }
                block.push_str(&self.text);
                block
            }
        }
    }

    pub fn info(&self) -> AttachmentInfo {
        AttachmentInfo {
            name: self.name.clone(),
            size: self.size,
            kind: match self.error {
                Some(_) => "error".to_string(),
                None => self.format.as_str().to_string(),
            },
            truncated: self.truncated,
        }
    }
}

/// Emitted when the aggregate estimate is above the warn threshold but within the hard cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeWarning {
    pub estimated_tokens: usize,
    pub threshold: usize,
}

impl fmt::Display for SizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The message with attachments is large (~{} tokens). The response may take longer than usual.",
            self.estimated_tokens
        )
    }
}

/// The admitted prompt, ready to be sent as the new user message.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub estimated_tokens: usize,
    pub warning: Option<SizeWarning>,
}

impl AssembledContext {
    pub fn attachment_infos(&self) -> Vec<AttachmentInfo> {
        self.attachments.iter().map(Attachment::info).collect()
    }
}

/// Builds bounded prompts from a message and its uploads.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    budget: TokenBudget,
    options: ExtractOptions,
}

impl ContextAssembler {
    pub fn new(budget: TokenBudget, options: ExtractOptions) -> Self {
        Self { budget, options }
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    /// Extracts every upload in order on the calling thread.
    pub fn assemble(
        &self,
        message: &str,
        uploads: &[Upload],
    ) -> Result<AssembledContext, ContextError> {
        let attachments = uploads
            .iter()
            .map(|upload| {
                let result = ingest::extract(&upload.name, &upload.bytes, &self.options);
                Attachment::from_extraction(
                    &upload.name,
                    upload.bytes.len() as u64,
                    result,
                    &self.budget,
                )
            })
            .collect();
        self.finish(message, attachments)
    }

    /// Extracts every upload in order on the blocking pool, applying the
    /// extraction timeout to each.
    #[instrument(skip_all, fields(uploads = uploads.len()))]
    pub async fn assemble_async(
        &self,
        message: &str,
        uploads: Vec<Upload>,
    ) -> Result<AssembledContext, ContextError> {
        let mut attachments = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let size = upload.bytes.len() as u64;
            let result = ingest::extract_with_timeout(&upload.name, upload.bytes, &self.options).await;
            attachments.push(Attachment::from_extraction(
                &upload.name,
                size,
                result,
                &self.budget,
            ));
        }
        self.finish(message, attachments)
    }

    fn finish(
        &self,
        message: &str,
        attachments: Vec<Attachment>,
    ) -> Result<AssembledContext, ContextError> {
        let mut parts = Vec::with_capacity(attachments.len() + 1);
        parts.push(message.to_string());
        parts.extend(attachments.iter().map(|a| a.render_block(&self.budget)));
        let text = parts.join("\n\n");

        let estimated_tokens = self.budget.estimate(&text);
        let warning = match self.budget.classify(estimated_tokens) {
            BudgetLevel::OverHardCap => {
                warn!(
                    estimated_tokens,
                    limit = self.budget.hard_cap_tokens,
                    "Assembled context exceeds the hard cap."
                );
                return Err(ContextError::TooLarge {
                    estimated: estimated_tokens,
                    limit: self.budget.hard_cap_tokens,
                });
            }
            BudgetLevel::Warn => {
                warn!(estimated_tokens, "Assembled context is above the warn threshold.");
                Some(SizeWarning {
                    estimated_tokens,
                    threshold: self.budget.warn_threshold_tokens,
                })
            }
            BudgetLevel::Ok => None,
        };

        info!(
            attachments = attachments.len(),
            estimated_tokens, "Context assembled."
        );
        Ok(AssembledContext {
            text,
            attachments,
            estimated_tokens,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_without_uploads() {
        let assembler = ContextAssembler::default();
        let context = assembler.assemble("hello there", &[]).unwrap();
        assert_eq!(context.text, "hello there");
        assert!(context.attachments.is_empty());
        assert!(context.warning.is_none());
    }

    #[test]
    fn test_blocks_follow_message_in_upload_order() {
        let assembler = ContextAssembler::default();
        let uploads = vec![
            Upload::new("a.txt", b"first file".to_vec()),
            Upload::new("b.md", b"second file".to_vec()),
        ];
        let context = assembler.assemble("summarize", &uploads).unwrap();
        assert_eq!(
            context.text,
            "summarize\n\n--- a.txt (Text) ---\nfirst file\n\n--- b.md (Text) ---\nsecond file"
        );
        let infos = context.attachment_infos();
        assert_eq!(infos[0].kind, "plain-text");
        assert_eq!(infos[1].size, 11);
    }

    #[test]
    fn test_failed_extraction_is_inline_and_non_fatal() {
        let assembler = ContextAssembler::default();
        let uploads = vec![
            Upload::new("broken.csv", b"a,b\n1,2,3\n".to_vec()),
            Upload::new("ok.txt", b"fine".to_vec()),
        ];
        let context = assembler.assemble("check", &uploads).unwrap();
        assert!(context.text.contains("--- broken.csv (error) ---"));
        assert!(context.text.ends_with("--- ok.txt (Text) ---\nfine"));
        assert_eq!(context.attachment_infos()[0].kind, "error");
    }

    #[test]
    fn test_truncated_attachment_carries_notice() {
        let budget = TokenBudget {
            per_attachment_tokens: 10,
            ..Default::default()
        };
        let assembler = ContextAssembler::new(budget, ExtractOptions::default());
        let uploads = vec![Upload::new("long.txt", "x".repeat(100).into_bytes())];
        let context = assembler.assemble("", &uploads).unwrap();
        let attachment = &context.attachments[0];
        assert!(attachment.truncated);
        assert_eq!(attachment.text.len(), 40);
        assert_eq!(attachment.original_chars, 100);
        assert!(context.text.contains("[Note: this file is large and was truncated"));
    }

    #[test]
    fn test_gate_warns_then_blocks() {
        let budget = TokenBudget {
            per_attachment_tokens: 1_000,
            hard_cap_tokens: 100,
            warn_threshold_tokens: 50,
            chars_per_token: 4,
        };
        let assembler = ContextAssembler::new(budget, ExtractOptions::default());

        let context = assembler.assemble(&"w".repeat(240), &[]).unwrap();
        let warning = context.warning.unwrap();
        assert_eq!(warning.estimated_tokens, 60);

        let err = assembler.assemble(&"w".repeat(404), &[]).unwrap_err();
        assert_eq!(
            err,
            ContextError::TooLarge {
                estimated: 101,
                limit: 100
            }
        );
    }
}
