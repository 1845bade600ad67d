//! # Chat Stream Orchestrator
//!
//! Sends a session to the provider and relays the reply delta by delta over a
//! channel, accumulating the text as it goes. Whatever has been relayed when
//! the stream ends (normally, on error, or because the consumer went away) is
//! appended to the session as the assistant's message, so partial output is
//! never lost. Nothing is retried.

use super::{
    message::{ChatMessage, Role},
    session::ChatSession,
};
use crate::{
    context::{AssembledContext, ContextAssembler, Upload},
    errors::{ContextError, PromptError},
    providers::ai::{AiProvider, ProviderMessage},
};
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// One event on the relay channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Delta { content: String },
    Warning { message: String, estimated_tokens: usize },
    Error { message: String },
    Done,
}

/// How the stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed(String),
    /// The receiving side was dropped before the provider finished.
    Cancelled,
}

/// The outcome plus the text that became the assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub outcome: StreamOutcome,
    pub reply: String,
}

/// A new user turn plus the event, if any, that must precede its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedTurn {
    pub user_message: ChatMessage,
    pub warning: Option<StreamEvent>,
}

impl ComposedTurn {
    /// A plain turn with no attachments and no size warning.
    pub fn plain(user_message: ChatMessage) -> Self {
        Self {
            user_message,
            warning: None,
        }
    }
}

impl From<AssembledContext> for ComposedTurn {
    fn from(context: AssembledContext) -> Self {
        let warning = context.warning.map(|w| StreamEvent::Warning {
            message: w.to_string(),
            estimated_tokens: w.estimated_tokens,
        });
        let infos = context.attachment_infos();
        Self {
            user_message: ChatMessage::user(context.text).with_attachments(infos),
            warning,
        }
    }
}

/// Drives one streamed completion per call.
#[derive(Debug, Clone)]
pub struct ChatOrchestrator {
    provider: Box<dyn AiProvider>,
    idle_timeout: Option<Duration>,
}

impl ChatOrchestrator {
    pub fn new(provider: Box<dyn AiProvider>) -> Self {
        Self {
            provider,
            idle_timeout: None,
        }
    }

    /// Fails the stream when no delta arrives within `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// The provider request for a session: the active system prompt (if any)
    /// followed by every message in order.
    pub fn build_messages(session: &ChatSession) -> Vec<ProviderMessage> {
        let mut messages = Vec::with_capacity(session.messages().len() + 1);
        if let Some(system_prompt) = session.system_prompt() {
            messages.push(ProviderMessage::new(Role::System, system_prompt));
        }
        messages.extend(
            session
                .messages()
                .iter()
                .map(|m| ProviderMessage::new(m.role, m.content.clone())),
        );
        messages
    }

    /// Appends `user_message` to the session, streams the reply to `tx`, and
    /// appends the accumulated reply as the assistant message.
    ///
    /// Exactly one terminal event is sent: `Done` on success or `Error` on
    /// failure. No terminal event is sent after cancellation.
    #[instrument(skip_all, fields(history = session.messages().len()))]
    pub async fn stream_reply(
        &self,
        session: &mut ChatSession,
        user_message: ChatMessage,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> StreamReport {
        session.push(user_message);
        let messages = Self::build_messages(session);

        let mut reply = String::new();
        let outcome = match self.provider.stream_chat(messages).await {
            Ok(mut stream) => loop {
                let next = match self.idle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                        Ok(next) => next,
                        Err(_) => Some(Err(PromptError::Timeout(limit.as_secs()))),
                    },
                    None => stream.next().await,
                };

                match next {
                    Some(Ok(delta)) => {
                        if delta.is_empty() {
                            continue;
                        }
                        let event = StreamEvent::Delta {
                            content: delta.clone(),
                        };
                        if tx.send(event).await.is_err() {
                            debug!("Consumer disconnected; stopping the provider stream.");
                            break StreamOutcome::Cancelled;
                        }
                        reply.push_str(&delta);
                    }
                    Some(Err(e)) => break self.fail(tx, e).await,
                    None => {
                        let _ = tx.send(StreamEvent::Done).await;
                        break StreamOutcome::Completed;
                    }
                }
            },
            Err(e) => self.fail(tx, e).await,
        };

        info!(
            outcome = ?outcome,
            reply_chars = reply.chars().count(),
            "Chat stream finished."
        );
        session.push(ChatMessage::assistant(reply.clone()));
        StreamReport { outcome, reply }
    }

    /// Sends the turn's warning, if any, then streams the reply.
    ///
    /// When the consumer is already gone before the warning is delivered the
    /// session is left untouched and the provider is never called.
    pub async fn stream_turn(
        &self,
        session: &mut ChatSession,
        turn: ComposedTurn,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> StreamReport {
        if let Some(warning) = turn.warning {
            if tx.send(warning).await.is_err() {
                debug!("Consumer disconnected before the size warning was delivered.");
                return StreamReport {
                    outcome: StreamOutcome::Cancelled,
                    reply: String::new(),
                };
            }
        }
        self.stream_reply(session, turn.user_message, tx).await
    }

    /// Assembles `message` with `uploads`, then streams the reply.
    ///
    /// When the assembled context is over the hard cap the session is left
    /// untouched and the provider is never called. A size warning, if any, is
    /// sent before the first delta.
    #[instrument(skip_all, fields(uploads = uploads.len()))]
    pub async fn compose_reply(
        &self,
        assembler: &ContextAssembler,
        session: &mut ChatSession,
        message: &str,
        uploads: Vec<Upload>,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<StreamReport, ContextError> {
        let context = assembler.assemble_async(message, uploads).await?;
        Ok(self.stream_turn(session, context.into(), tx).await)
    }

    async fn fail(&self, tx: &mpsc::Sender<StreamEvent>, error: PromptError) -> StreamOutcome {
        warn!("Provider stream failed: {error}");
        let message = error.to_string();
        let _ = tx
            .send(StreamEvent::Error {
                message: message.clone(),
            })
            .await;
        StreamOutcome::Failed(message)
    }
}
