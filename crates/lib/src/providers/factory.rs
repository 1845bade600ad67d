//! # AI Provider Factory
//!
//! Builds a provider client from [`ProviderConfig`]. Both the server and the
//! CLI go through this function so a given config means the same thing in
//! either front-end.

use crate::{
    constants::OPENAI_CHAT_COMPLETIONS_URL,
    errors::PromptError,
    providers::ai::{openai::OpenAiProvider, AiProvider},
    types::ProviderConfig,
};
use std::time::Duration;
use tracing::info;

/// Creates the configured provider.
///
/// - `openai` requires a non-empty API key and defaults the URL to the public endpoint.
/// - `local` requires an `api_url`; the key is optional.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn AiProvider>, PromptError> {
    let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());
    let connect_timeout = config.connect_timeout_secs.map(Duration::from_secs);

    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "openai" => {
            let api_key = api_key.ok_or(PromptError::MissingApiKey)?;
            let api_url = config
                .api_url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| OPENAI_CHAT_COMPLETIONS_URL.to_string());
            info!("Configuring OpenAI provider with URL: {}", api_url);
            Box::new(OpenAiProvider::new(
                api_url,
                Some(api_key),
                Some(config.model_name.clone()),
                connect_timeout,
            )?)
        }
        "local" => {
            let api_url = config.api_url.clone().filter(|u| !u.is_empty()).ok_or_else(|| {
                PromptError::Configuration("api_url is required for the local provider".to_string())
            })?;
            info!("Configuring local AI provider with URL: {}", api_url);
            Box::new(OpenAiProvider::new(
                api_url,
                api_key,
                Some(config.model_name.clone()),
                connect_timeout,
            )?)
        }
        other => {
            return Err(PromptError::Configuration(format!(
                "Unsupported AI provider type '{other}'"
            )))
        }
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key() {
        let config = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(PromptError::MissingApiKey)
        ));
    }

    #[test]
    fn test_local_requires_url_but_not_key() {
        let mut config = ProviderConfig {
            provider: "local".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(PromptError::Configuration(_))
        ));
        config.api_url = Some("http://localhost:1234/v1/chat/completions".to_string());
        assert!(create_provider(&config).is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let config = ProviderConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(PromptError::Configuration(_))
        ));
    }
}
