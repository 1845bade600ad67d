use thiserror::Error;

/// Errors raised while talking to a language-model provider.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(String),
    #[error("Provider stream failed: {0}")]
    Stream(String),
    #[error("Provider stream stalled for {0} seconds")]
    Timeout(u64),
    #[error("API key is missing")]
    MissingApiKey,
    #[error("AI provider is not configured: {0}")]
    Configuration(String),
    #[error("Failed to serialize or deserialize JSON: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

impl PromptError {
    /// True for errors that mean the provider was never usable, as opposed to
    /// a failure during an individual request.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PromptError::MissingApiKey | PromptError::Configuration(_)
        )
    }
}

/// Raised by the context gate when the assembled message is too large to send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("The message with attachments is too large (~{estimated} tokens). The limit is {limit} tokens; reduce the number or size of files.")]
    TooLarge { estimated: usize, limit: usize },
}

/// Errors from the prompt template catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown prompt category: {0}")]
    UnknownCategory(String),
    #[error("Prompt file not found for category '{0}'")]
    NotFound(String),
    #[error("Prompt template {id} not found in category '{category}'")]
    TemplateNotFound { category: String, id: u32 },
    #[error("Failed to read prompt file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed prompt file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("AI provider failed while authoring prompts: {0}")]
    Authoring(#[from] PromptError),
    #[error("AI provider reply did not contain any prompt templates")]
    EmptyAuthoring,
}

/// Errors from the on-disk chat history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Chat history not found: {0}")]
    NotFound(String),
    #[error("Invalid chat history filename: {0}")]
    InvalidName(String),
    #[error("Chat history I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed chat history file: {0}")]
    Parse(#[from] serde_json::Error),
}
