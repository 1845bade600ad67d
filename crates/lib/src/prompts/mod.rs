//! # Prompt Templates
//!
//! The category catalog of ready-made system prompts, plus model-assisted
//! authoring and export of new template sets.

pub mod authoring;
pub mod catalog;

pub use authoring::{author_prompts, export_prompts, parse_authored, PromptExport};
pub use catalog::{CategoryInfo, PromptCatalog, PromptCategory, PromptTemplate, CATEGORIES};
