//! # Chat Handlers
//!
//! Both chat routes answer with a server-sent-event stream. Each event's data
//! is one JSON object (`{"content"}`, `{"warning", "estimated_tokens"}` or
//! `{"error"}`), and a normal completion ends with `[DONE]`. The provider
//! stream runs in a spawned task; when the client disconnects the channel
//! closes and the task stops reading from the provider.

use super::{AppError, AppState};
use axum::{
    extract::State,
    response::sse::{Event as SseEvent, Sse},
    Json,
};
use axum_extra::extract::Multipart;
use futures::Stream;
use promptdesk::{
    ChatMessage, ChatOrchestrator, ChatSession, ComposedTurn, PromptTemplate, Role, StreamEvent,
    Upload,
};
use serde::Deserialize;
use serde_json::json;
use std::{convert::Infallible, sync::Arc};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{info, warn};

const STREAM_CHANNEL_CAPACITY: usize = 64;

#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// The client's conversation so far, sent as the `session` part of a compose request.
#[derive(Deserialize, Debug, Default)]
pub struct SessionPayload {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub selected_prompt: Option<PromptTemplate>,
}

fn to_sse(event: &StreamEvent) -> SseEvent {
    let data = match event {
        StreamEvent::Delta { content } => json!({ "content": content }).to_string(),
        StreamEvent::Warning {
            message,
            estimated_tokens,
        } => json!({ "warning": message, "estimated_tokens": estimated_tokens }).to_string(),
        StreamEvent::Error { message } => json!({ "error": message }).to_string(),
        StreamEvent::Done => "[DONE]".to_string(),
    };
    SseEvent::default().data(data)
}

/// Runs the orchestrator in a background task and exposes its events as SSE.
fn relay(
    orchestrator: Arc<ChatOrchestrator>,
    mut session: ChatSession,
    turn: ComposedTurn,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let report = orchestrator.stream_turn(&mut session, turn, &tx).await;
        info!(outcome = ?report.outcome, "Chat relay finished.");
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok(to_sse(&event)));
    Sse::new(stream)
}

/// Handler for `POST /api/chat`.
///
/// The last message must be the user's new turn; everything before it is
/// replayed as history.
pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    let orchestrator = app_state.orchestrator()?;

    let mut messages = payload.messages;
    let user_message = match messages.pop() {
        Some(message) if message.role == Role::User => message,
        _ => {
            return Err(AppError::BadRequest(
                "The last message must be a user message.".to_string(),
            ))
        }
    };

    let prompt = payload
        .system_prompt
        .filter(|p| !p.trim().is_empty())
        .map(|system_prompt| PromptTemplate {
            system_prompt,
            ..Default::default()
        });
    info!(history = messages.len(), "Chat request received.");

    let session = ChatSession::from_parts(messages, prompt);
    Ok(relay(orchestrator, session, ComposedTurn::plain(user_message)))
}

/// Handler for `POST /api/chat/compose`.
///
/// Multipart parts: `message` (text), any number of `file` parts, and an
/// optional `session` JSON document. Uploads are extracted and gated before
/// the provider is contacted; an oversized context is answered with 413.
pub async fn compose_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    let orchestrator = app_state.orchestrator()?;

    let mut message = String::new();
    let mut uploads = Vec::new();
    let mut session_payload = SessionPayload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "message" => {
                message = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read message: {e}")))?;
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload.txt").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                uploads.push(Upload::new(filename, bytes.to_vec()));
            }
            "session" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read session: {e}")))?;
                session_payload = serde_json::from_str(&raw)
                    .map_err(|e| AppError::BadRequest(format!("Invalid session JSON: {e}")))?;
            }
            _ => warn!("Ignoring unknown multipart field: {}", name),
        }
    }

    if message.trim().is_empty() && uploads.is_empty() {
        return Err(AppError::BadRequest(
            "Provide a message or at least one file.".to_string(),
        ));
    }
    info!(uploads = uploads.len(), "Compose request received.");

    let context = app_state.assembler.assemble_async(&message, uploads).await?;
    let session = ChatSession::from_parts(session_payload.messages, session_payload.selected_prompt);
    Ok(relay(orchestrator, session, ComposedTurn::from(context)))
}
