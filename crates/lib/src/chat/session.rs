use super::message::ChatMessage;
use crate::{history::HistoryRecord, prompts::PromptTemplate};

/// A caller-owned conversation: its messages and the active system prompt.
///
/// Messages are only ever appended. Selecting a prompt starts a new
/// conversation, and [`ChatSession::reset`] clears both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    active_prompt: Option<PromptTemplate>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(prompt: PromptTemplate) -> Self {
        Self {
            messages: Vec::new(),
            active_prompt: Some(prompt),
        }
    }

    /// Rebuilds a session from caller-supplied parts, e.g. a request body.
    pub fn from_parts(messages: Vec<ChatMessage>, active_prompt: Option<PromptTemplate>) -> Self {
        Self {
            messages,
            active_prompt,
        }
    }

    pub fn from_record(record: &HistoryRecord) -> Self {
        Self::from_parts(record.messages.clone(), record.selected_prompt.clone())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn active_prompt(&self) -> Option<&PromptTemplate> {
        self.active_prompt.as_ref()
    }

    /// The active system prompt text, if a non-empty one is selected.
    pub fn system_prompt(&self) -> Option<&str> {
        self.active_prompt
            .as_ref()
            .map(|p| p.system_prompt.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Switches the active prompt and clears the conversation.
    pub fn select_prompt(&mut self, prompt: PromptTemplate) {
        self.messages.clear();
        self.active_prompt = Some(prompt);
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.active_prompt = None;
    }

    pub fn into_parts(self) -> (Vec<ChatMessage>, Option<PromptTemplate>) {
        (self.messages, self.active_prompt)
    }
}
