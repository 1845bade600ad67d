use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Builds the CORS layer from the configured origins. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(app_state.config.upload_limit_bytes);
    let cors = cors_layer(&app_state.config.cors_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/categories", get(handlers::list_categories_handler))
        .route("/api/prompts/{category}", get(handlers::get_prompts_handler))
        .route(
            "/api/prompts/{category}/sample",
            get(handlers::sample_prompts_handler),
        )
        .route(
            "/api/upload",
            post(handlers::upload_handler).layer(upload_limit.clone()),
        )
        .route("/api/chat", post(handlers::chat_handler))
        .route(
            "/api/chat/compose",
            post(handlers::compose_handler).layer(upload_limit),
        )
        .route(
            "/api/chat-history",
            get(handlers::list_history_handler).post(handlers::save_history_handler),
        )
        .route(
            "/api/chat-history/{filename}",
            get(handlers::get_history_handler).delete(handlers::delete_history_handler),
        )
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
