//! # Prompt Authoring and Export
//!
//! Asks the model to write new templates for a theme, and writes sampled or
//! authored template sets to timestamped JSON files.

use super::catalog::PromptTemplate;
use crate::{
    chat::message::Role,
    constants::HISTORY_TIMESTAMP_FORMAT,
    errors::CatalogError,
    providers::ai::{complete, AiProvider, ProviderMessage},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// System prompt for template authoring.
pub const AUTHORING_SYSTEM_PROMPT: &str = r#"You are an expert prompt engineer.
Write effective system prompts for the theme the user gives you.

Each prompt must contain:
1. title: a short title for the prompt
2. system_prompt: the system prompt itself, concrete and practical
3. recommended_attachments: a list of 4-6 files a user should attach

Reply with JSON only, in the form {"prompts": [...]}."#;

/// User prompt for template authoring.
///
/// Placeholders: `{theme}`, `{category}`, `{count}`
pub const AUTHORING_USER_PROMPT: &str = r#"Theme: {theme}
Category: {category}
Count: {count}

Write {count} practical and varied system prompts for the theme above.
Each prompt should take a different angle or approach."#;

/// The file written by [`export_prompts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptExport {
    pub category: String,
    pub generated_count: usize,
    pub prompts: Vec<PromptTemplate>,
}

/// Requests `count` new templates for `theme` and normalizes the reply.
pub async fn author_prompts(
    provider: &dyn AiProvider,
    theme: &str,
    count: usize,
    category: Option<&str>,
) -> Result<Vec<PromptTemplate>, CatalogError> {
    let user_prompt = AUTHORING_USER_PROMPT
        .replace("{theme}", theme)
        .replace("{category}", category.unwrap_or("unspecified"))
        .replace("{count}", &count.to_string());

    let messages = vec![
        ProviderMessage::new(Role::System, AUTHORING_SYSTEM_PROMPT),
        ProviderMessage::new(Role::User, user_prompt),
    ];
    info!(theme, count, "Requesting prompt templates from AI provider.");
    let reply = complete(provider, messages).await?;
    debug!("<-- Authoring reply: {}", reply);

    let prompts = parse_authored(&reply)?;
    info!(generated = prompts.len(), "Authored prompt templates.");
    Ok(prompts)
}

/// Accepts `{"prompts": [...]}`, a bare array, or a single object, and
/// numbers the templates from 1.
pub fn parse_authored(reply: &str) -> Result<Vec<PromptTemplate>, CatalogError> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| Regex::new(r"```(?:json)?\n?([\s\S]*?)```").expect("valid regex"));
    let body = re
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| reply.trim());

    let value: Value = serde_json::from_str(body)?;
    let items = match value {
        Value::Object(mut map) if map.contains_key("prompts") => match map.remove("prompts") {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        },
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut prompts = items
        .into_iter()
        .map(serde_json::from_value::<PromptTemplate>)
        .collect::<Result<Vec<_>, _>>()?;
    if prompts.is_empty() {
        return Err(CatalogError::EmptyAuthoring);
    }
    for (idx, prompt) in prompts.iter_mut().enumerate() {
        prompt.id = idx as u32 + 1;
    }
    Ok(prompts)
}

/// Writes `{dir}/{category}_{YYYYMMDD_HHMMSS}.json` and returns its path.
pub fn export_prompts(
    dir: &Path,
    category: &str,
    prompts: Vec<PromptTemplate>,
) -> Result<PathBuf, CatalogError> {
    std::fs::create_dir_all(dir)?;
    let timestamp = chrono::Local::now().format(HISTORY_TIMESTAMP_FORMAT);
    let path = dir.join(format!("{category}_{timestamp}.json"));

    let export = PromptExport {
        category: category.to_string(),
        generated_count: prompts.len(),
        prompts,
    };
    std::fs::write(&path, serde_json::to_string_pretty(&export)?)?;
    info!(path = %path.display(), "Exported prompt templates.");
    Ok(path)
}
