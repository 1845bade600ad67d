pub mod openai;

use crate::{chat::message::Role, errors::PromptError};
use async_trait::async_trait;
use dyn_clone::DynClone;
use futures::{stream::BoxStream, StreamExt};
use serde::Serialize;
use std::fmt::Debug;

/// A message in the shape providers expect: role and text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: String,
}

impl ProviderMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Incremental text fragments of one completion, in order.
pub type DeltaStream = BoxStream<'static, Result<String, PromptError>>;

/// A trait for interacting with a streaming chat-completion provider.
///
/// Opening the stream may fail (bad credentials, unreachable host); once it
/// is open, a failure surfaces as an `Err` item and ends the stream.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    async fn stream_chat(&self, messages: Vec<ProviderMessage>) -> Result<DeltaStream, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Drains a completion into a single string.
pub async fn complete(
    provider: &dyn AiProvider,
    messages: Vec<ProviderMessage>,
) -> Result<String, PromptError> {
    let mut stream = provider.stream_chat(messages).await?;
    let mut reply = String::new();
    while let Some(delta) = stream.next().await {
        reply.push_str(&delta?);
    }
    Ok(reply)
}
