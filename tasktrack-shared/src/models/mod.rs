//! Database models for the task tracker
//!
//! Each model owns its SQL. Every project and task operation takes the owning
//! user's id and includes it in the statement, so a row belonging to another
//! user is indistinguishable from a missing one.
//!
//! # Models
//!
//! - `user`: user accounts
//! - `project`: named groupings of tasks
//! - `task`: work items with status, priority, due date and tags
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use tasktrack_shared::models::project::{CreateProject, Project};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
//! let project = Project::create(&pool, owner_id, CreateProject {
//!     name: "Inbox".to_string(),
//!     description: None,
//!     color: Some("#3366FF".to_string()),
//! }, Utc::now()).await?;
//!
//! let projects = Project::list_by_owner(&pool, owner_id).await?;
//! assert!(projects.iter().any(|p| p.id == project.id));
//! # Ok(())
//! # }
//! ```

pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes a present field into `Some`, including an explicit `null`
///
/// Combined with `#[serde(default)]` on an `Option<Option<T>>` field this
/// distinguishes "absent" (`None`) from "set to null" (`Some(None)`).
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
