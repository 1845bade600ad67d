use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use promptdesk::{CatalogError, ContextError, HistoryError, IngestError, PromptError};
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors from the chat provider or its configuration.
    Prompt(PromptError),
    /// The assembled context was refused by the size gate.
    Context(ContextError),
    /// A single uploaded file could not be read.
    Ingest(IngestError),
    Catalog(CatalogError),
    History(HistoryError),
    /// Malformed requests.
    BadRequest(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        AppError::Prompt(err)
    }
}

impl From<ContextError> for AppError {
    fn from(err: ContextError) -> Self {
        AppError::Context(err)
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Ingest(err)
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Catalog(err)
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        AppError::History(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Prompt(err) => {
                error!("PromptError: {:?}", err);
                let status = if err.is_configuration() {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    match err {
                        PromptError::ReqwestClientBuild(_) | PromptError::JsonSerialization(_) => {
                            StatusCode::INTERNAL_SERVER_ERROR
                        }
                        _ => StatusCode::BAD_GATEWAY,
                    }
                };
                (status, err.to_string())
            }
            AppError::Context(err) => {
                warn!("Context refused: {err}");
                let ContextError::TooLarge { estimated, limit } = &err;
                let body = Json(json!({
                    "error": err.to_string(),
                    "estimated_tokens": estimated,
                    "limit": limit,
                }));
                return (StatusCode::PAYLOAD_TOO_LARGE, body).into_response();
            }
            AppError::Ingest(err) => {
                warn!("File extraction failed: {err}");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Catalog(err) => {
                let status = match err {
                    CatalogError::UnknownCategory(_)
                    | CatalogError::NotFound(_)
                    | CatalogError::TemplateNotFound { .. } => StatusCode::NOT_FOUND,
                    CatalogError::Authoring(_) | CatalogError::EmptyAuthoring => {
                        StatusCode::BAD_GATEWAY
                    }
                    CatalogError::Io(_) | CatalogError::Parse(_) => {
                        error!("CatalogError: {:?}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
            AppError::History(err) => {
                let status = match err {
                    HistoryError::NotFound(_) => StatusCode::NOT_FOUND,
                    HistoryError::InvalidName(_) => StatusCode::BAD_REQUEST,
                    HistoryError::Io(_) | HistoryError::Parse(_) => {
                        error!("HistoryError: {:?}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
