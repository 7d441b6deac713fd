//! Project endpoints
//!
//! # Endpoints
//!
//! - `POST   /v1/projects` - Create a project
//! - `GET    /v1/projects` - List projects, newest first
//! - `GET    /v1/projects/:id` - Get one project
//! - `GET    /v1/projects/:id/tasks` - The project's tasks, newest first
//! - `PUT    /v1/projects/:id` - Partial update
//! - `DELETE /v1/projects/:id` - Delete the project and its tasks

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{IdPath, ValidJson},
    routes::validation::{check_color, validate_color},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use tasktrack_shared::{
    auth::{authorization::require_ownership, guard::AuthUser},
    models::{
        deserialize_some,
        project::{CreateProject, Project, UpdateProject},
        task::Task,
    },
    tasks,
};
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// `#RRGGBB`
    #[serde(default)]
    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
}

/// Update project request; absent fields are unchanged, `null` clears
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub color: Option<Option<String>>,
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state
        .store
        .insert_project(
            auth.user_id,
            CreateProject {
                name: req.name,
                description: req.description,
                color: req.color,
            },
            Utc::now(),
        )
        .await?;

    tracing::info!(project_id = %project.id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.store.list_projects(auth.user_id).await?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Project>> {
    let project = state
        .store
        .find_project(auth.user_id, id)
        .await?
        .ok_or_else(ApiError::project_not_found)?;
    require_ownership(&auth, project.user_id).map_err(|_| ApiError::project_not_found())?;

    Ok(Json(project))
}

/// Tasks of one project
///
/// # Errors
///
/// - `404 Not Found`: the project is not the caller's
pub async fn project_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = tasks::project_tasks(state.store.as_ref(), auth.user_id, id, Utc::now()).await?;
    Ok(Json(tasks))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    check_color(req.color.as_ref())?;

    let project = state
        .store
        .update_project(
            auth.user_id,
            id,
            UpdateProject {
                name: req.name,
                description: req.description,
                color: req.color,
            },
            Utc::now(),
        )
        .await?
        .ok_or_else(ApiError::project_not_found)?;

    tracing::info!(project_id = %project.id, "Project updated");
    Ok(Json(project))
}

/// Delete a project together with its tasks
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<StatusCode> {
    if !state.store.delete_project(auth.user_id, id).await? {
        return Err(ApiError::project_not_found());
    }

    tracing::info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
