//! # Chat History Handlers

use super::{AppError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use promptdesk::{ChatMessage, HistoryRecord, HistorySummary, PromptTemplate};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HistoryListResponse {
    pub histories: Vec<HistorySummary>,
}

#[derive(Deserialize, Debug)]
pub struct SaveHistoryRequest {
    #[serde(default)]
    pub title: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub selected_prompt: Option<PromptTemplate>,
}

#[derive(Serialize)]
pub struct SaveHistoryResponse {
    pub filename: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct DeleteHistoryResponse {
    pub message: String,
}

pub async fn list_history_handler(
    State(app_state): State<AppState>,
) -> Result<Json<HistoryListResponse>, AppError> {
    let histories = app_state.history.list()?;
    Ok(Json(HistoryListResponse { histories }))
}

pub async fn get_history_handler(
    State(app_state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<HistoryRecord>, AppError> {
    Ok(Json(app_state.history.read(&filename)?))
}

pub async fn save_history_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SaveHistoryRequest>,
) -> Result<Json<SaveHistoryResponse>, AppError> {
    let filename =
        app_state
            .history
            .save(&payload.title, payload.messages, payload.selected_prompt)?;
    Ok(Json(SaveHistoryResponse {
        filename,
        message: "Chat history saved.".to_string(),
    }))
}

pub async fn delete_history_handler(
    State(app_state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteHistoryResponse>, AppError> {
    app_state.history.delete(&filename)?;
    Ok(Json(DeleteHistoryResponse {
        message: format!("Deleted {filename}."),
    }))
}
