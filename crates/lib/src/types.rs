use crate::constants::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};

/// Settings for the chat-completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The type of provider: `"openai"` or `"local"` (any OpenAI-compatible endpoint).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Optional for `openai`, where the public endpoint is the default.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_url: None,
            api_key: None,
            model_name: default_model_name(),
            connect_timeout_secs: None,
        }
    }
}
