//! # promptdesk
//!
//! Document ingestion, context budgeting, and streaming chat for a
//! prompt-template driven assistant.
//!
//! The pipeline runs in three stages:
//!
//! 1. [`ingest`] turns uploaded PDF, Word, spreadsheet, CSV, and plain-text
//!    bytes into text, probing encodings where none is declared.
//! 2. [`context`] bounds each attachment with the [`budget`] heuristics and
//!    gates the assembled prompt on its aggregate size.
//! 3. [`chat`] relays the provider's streamed reply while accumulating it into
//!    the caller's session.
//!
//! The [`prompts`] catalog and the [`history`] store are the collaborators
//! that feed and persist sessions.

pub mod budget;
pub mod chat;
pub mod constants;
pub mod context;
pub mod errors;
pub mod history;
pub mod ingest;
pub mod prompts;
pub mod providers;
pub mod types;

pub use budget::{BudgetLevel, TokenBudget};
pub use chat::{
    AttachmentInfo, ChatMessage, ChatOrchestrator, ChatSession, ComposedTurn, Role, StreamEvent,
    StreamOutcome, StreamReport,
};
pub use context::{AssembledContext, Attachment, ContextAssembler, SizeWarning, Upload};
pub use errors::{CatalogError, ContextError, HistoryError, PromptError};
pub use history::{HistoryRecord, HistoryStore, HistorySummary};
pub use ingest::{DocumentFormat, ExtractOptions, Extraction, IngestError, TextEncodingPolicy};
pub use prompts::{PromptCatalog, PromptTemplate};
pub use types::ProviderConfig;
