//! # Prompt Catalog Handlers
//!
//! Read-only access to the category list and the template files.

use super::{AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use promptdesk::{
    constants::DEFAULT_SAMPLE_COUNT,
    prompts::{CategoryInfo, PromptCategory},
    PromptTemplate,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryInfo>,
}

#[derive(Deserialize, Debug)]
pub struct SampleParams {
    pub count: Option<usize>,
}

#[derive(Serialize)]
pub struct SampleResponse {
    pub category: String,
    pub prompts: Vec<PromptTemplate>,
}

/// Lists every prompt category in catalog order.
pub async fn list_categories_handler(State(app_state): State<AppState>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: app_state.catalog.list_categories(),
    })
}

/// Returns one category's template file.
pub async fn get_prompts_handler(
    State(app_state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<PromptCategory>, AppError> {
    let prompts = app_state.catalog.load(&category)?;
    Ok(Json(prompts))
}

/// Returns `count` templates drawn at random from a category.
pub async fn sample_prompts_handler(
    State(app_state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<SampleParams>,
) -> Result<Json<SampleResponse>, AppError> {
    let count = params.count.unwrap_or(DEFAULT_SAMPLE_COUNT);
    let prompts = app_state.catalog.sample(&category, count)?;
    info!(category = %category, requested = count, returned = prompts.len(), "Sampled prompts.");
    Ok(Json(SampleResponse { category, prompts }))
}
