//! Persistence boundary
//!
//! [`Store`] is the narrow interface the HTTP layer talks to. Every project and
//! task method is qualified by the owning user's id; an entity owned by
//! someone else is reported exactly like an absent one (`Ok(None)` /
//! `Ok(false)`).
//!
//! Two implementations:
//!
//! - [`PgStore`]: Postgres through the models' SQL
//! - [`MemoryStore`]: process-local maps, same semantics, used by tests and
//!   local runs without a database
//!
//! Timestamps are supplied by the caller (`now`) so the clock stays at the
//! edge of the system.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{NewUser, User};
use crate::query::TaskFilter;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),

    /// A task referenced a project that is absent or owned by someone else
    #[error("Project not found")]
    ProjectNotFound,

    /// The backing store could not be reached in time
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other storage failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let message = match db_err.constraint() {
                    Some("users_username_key") => "Username already registered",
                    Some("users_email_key") => "Email already registered",
                    _ => "Resource already exists",
                };
                StoreError::Conflict(message.to_string())
            }
            sqlx::Error::Database(db_err)
                if db_err.is_foreign_key_violation()
                    && db_err.constraint() == Some("tasks_project_owner_fkey") =>
            {
                StoreError::ProjectNotFound
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Owner-scoped persistence operations
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Creates a user; `Conflict` if the username or email is taken
    async fn insert_user(&self, data: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
        now: DateTime<Utc>,
    ) -> Result<Project, StoreError>;

    async fn find_project(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// The owner's projects, newest first
    async fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError>;

    async fn update_project(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateProject,
        now: DateTime<Utc>,
    ) -> Result<Option<Project>, StoreError>;

    /// Deletes a project together with its tasks
    async fn delete_project(&self, owner_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// Creates a task; `ProjectNotFound` if `project_id` is not the owner's
    async fn insert_task(
        &self,
        owner_id: Uuid,
        data: CreateTask,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError>;

    async fn find_task(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// The owner's tasks matching `filter`, in the filter's order
    async fn query_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError>;

    /// Updates a task; `ProjectNotFound` if it moves to a foreign project
    async fn update_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateTask,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, owner_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// Marks a task done; idempotent
    async fn complete_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError>;
}
