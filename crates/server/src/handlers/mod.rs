//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `promptdesk-server`.
//! The handlers are split into logical sub-modules based on their functionality.

pub mod chat;
pub mod general;
pub mod history;
pub mod prompts;
pub mod upload;

// Re-export all handlers so the router can reach them under a single `handlers::` path.
pub use chat::*;
pub use general::*;
pub use history::*;
pub use prompts::*;
pub use upload::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
