//! Task endpoints
//!
//! # Endpoints
//!
//! - `POST   /v1/tasks` - Create a task
//! - `GET    /v1/tasks` - List tasks with filters
//! - `GET    /v1/tasks/:id` - Get one task
//! - `PUT    /v1/tasks/:id` - Partial update
//! - `DELETE /v1/tasks/:id` - Delete
//! - `PATCH  /v1/tasks/:id/complete` - Mark done (idempotent)
//!
//! # Listing filters
//!
//! ```text
//! GET /v1/tasks?status=todo&priority=high&project_id=none&tags=work,urgent
//!              &overdue=true&search=report&sort_by=due_date&sort_order=asc
//! ```
//!
//! All filters are optional and combine with AND. `project_id=none` selects
//! tasks without a project; `tags` requires every listed tag.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{IdPath, QueryParams, ValidJson},
    routes::validation::normalize_tags,
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tasktrack_shared::{
    auth::{authorization::require_ownership, guard::AuthUser},
    models::{
        deserialize_some,
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
    },
    query::{TaskFilter, TaskQueryParams},
    tasks,
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub project_id: Option<Uuid>,
}

/// Update task request; absent fields are unchanged, `null` clears
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub project_id: Option<Option<Uuid>>,
}

impl CreateTaskRequest {
    fn into_create(self) -> ApiResult<CreateTask> {
        Ok(CreateTask {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            tags: normalize_tags(self.tags)?,
            project_id: self.project_id,
        })
    }
}

impl UpdateTaskRequest {
    fn into_update(self) -> ApiResult<UpdateTask> {
        Ok(UpdateTask {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            tags: self.tags.map(normalize_tags).transpose()?,
            project_id: self.project_id,
        })
    }
}

/// Create a task
///
/// # Errors
///
/// - `404 Not Found`: `project_id` is not one of the caller's projects
/// - `422 Unprocessable Entity`: invalid fields
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = tasks::create_task(
        state.store.as_ref(),
        auth.user_id,
        req.into_create()?,
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// # Errors
///
/// - `422 Unprocessable Entity`: unknown enum value, malformed id or sort key,
///   or an unparseable query string such as a repeated key
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(params): QueryParams<TaskQueryParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskFilter::try_from(params)?;
    let tasks = tasks::query_tasks(state.store.as_ref(), auth.user_id, &filter, Utc::now()).await?;

    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Task>> {
    let task = tasks::get_task(state.store.as_ref(), auth.user_id, id).await?;
    require_ownership(&auth, task.user_id).map_err(|_| ApiError::task_not_found())?;

    Ok(Json(task))
}

/// Update a task
///
/// # Errors
///
/// - `404 Not Found`: task, or the project it is moved to, is not the caller's
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = tasks::update_task(
        state.store.as_ref(),
        auth.user_id,
        id,
        req.into_update()?,
        Utc::now(),
    )
    .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<StatusCode> {
    tasks::delete_task(state.store.as_ref(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a task done
///
/// Repeating the call returns the task unchanged.
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Task>> {
    let task = tasks::complete_task(state.store.as_ref(), auth.user_id, id, Utc::now()).await?;
    Ok(Json(task))
}
