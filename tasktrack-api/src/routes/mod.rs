//! API route handlers
//!
//! Organized by resource:
//!
//! - `health`: service info and health check
//! - `auth`: registration, login, current user
//! - `tasks`: task CRUD, filtered listing and completion
//! - `projects`: project CRUD and per-project task listing
//!
//! Every protected handler receives the caller as `Extension<AuthUser>` and
//! passes `auth.user_id` as the owner to the store.

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

mod validation;

use crate::error::ApiError;

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
