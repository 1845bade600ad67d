//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration, the
//! prompt catalog, the history store, the context assembler, and the chat
//! orchestrator, making them accessible to all request handlers.

use crate::{config::AppConfig, errors::AppError};
use promptdesk::{
    providers::create_provider, ChatOrchestrator, ContextAssembler, ExtractOptions, HistoryStore,
    PromptCatalog, PromptError,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    pub catalog: Arc<PromptCatalog>,
    pub history: Arc<HistoryStore>,
    pub assembler: Arc<ContextAssembler>,
    /// `None` when the provider could not be configured; chat routes then fail.
    pub orchestrator: Option<Arc<ChatOrchestrator>>,
    /// Why the orchestrator is missing, reported on every chat request.
    pub provider_error: Option<String>,
}

impl AppState {
    /// Returns the orchestrator or the configuration error that disabled it.
    pub fn orchestrator(&self) -> Result<Arc<ChatOrchestrator>, AppError> {
        self.orchestrator.clone().ok_or_else(|| {
            let reason = self
                .provider_error
                .clone()
                .unwrap_or_else(|| "no provider configured".to_string());
            AppError::Prompt(PromptError::Configuration(reason))
        })
    }
}

/// Builds the shared application state from the configuration.
///
/// A provider that cannot be built (for example, a missing API key) does not
/// stop the server; the catalog and history routes keep working.
pub fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let (orchestrator, provider_error) = match create_provider(&config.provider) {
        Ok(provider) => {
            info!(
                provider = %config.provider.provider,
                model = %config.provider.model_name,
                "Initialized chat provider."
            );
            let orchestrator = ChatOrchestrator::new(provider)
                .with_idle_timeout(Duration::from_secs(config.stream_idle_timeout_secs));
            (Some(Arc::new(orchestrator)), None)
        }
        Err(e) => {
            warn!("Chat is disabled: {e}");
            (None, Some(e.to_string()))
        }
    };

    let history = HistoryStore::new(&config.history_dir)?;
    info!(dir = %config.history_dir, "Initialized chat history store.");

    let options = ExtractOptions {
        text_encoding: config.text_encoding_policy,
        timeout: Some(Duration::from_secs(config.extraction_timeout_secs)),
    };
    let assembler = ContextAssembler::new(config.budget, options);

    Ok(AppState {
        catalog: Arc::new(PromptCatalog::new(&config.prompts_dir)),
        history: Arc::new(history),
        assembler: Arc::new(assembler),
        orchestrator,
        provider_error,
        config: Arc::new(config),
    })
}
