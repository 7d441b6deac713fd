//! Task model and database operations
//!
//! A task belongs to exactly one user and optionally to one of that user's
//! projects.
//!
//! # Lifecycle
//!
//! ```text
//! todo ⇄ in_progress ⇄ done     (any transition allowed through update)
//! *    → done                   (complete; idempotent)
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
//! CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     project_id UUID,
//!     title VARCHAR(200) NOT NULL,
//!     description TEXT,
//!     status task_status NOT NULL DEFAULT 'todo',
//!     priority task_priority NOT NULL DEFAULT 'medium',
//!     due_date TIMESTAMPTZ,
//!     tags TEXT[] NOT NULL DEFAULT '{}',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT tasks_project_owner_fkey FOREIGN KEY (project_id, user_id)
//!         REFERENCES projects (id, user_id) ON DELETE CASCADE
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use tasktrack_shared::models::task::{CreateTask, Task, TaskPriority};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
//! let task = Task::create(&pool, owner_id, CreateTask {
//!     title: "Write report".to_string(),
//!     priority: TaskPriority::High,
//!     tags: vec!["work".to_string()],
//!     ..Default::default()
//! }, Utc::now()).await?;
//!
//! let done = Task::complete(&pool, owner_id, task.id, Utc::now()).await?;
//! assert!(done.is_some());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::deserialize_some;
use crate::query::TaskFilter;

pub(crate) const TASK_COLUMNS: &str = "id, user_id, project_id, title, description, status, \
     priority, due_date, tags, created_at, updated_at";

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("expected one of todo, in_progress, done; got '{}'", s))
    }
}

/// Task priority
///
/// Variant order is the semantic order (`Low < Medium < High`), matching the
/// declaration order of the Postgres enum so both sort the same way.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| format!("expected one of low, medium, high; got '{}'", s))
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Optional project, always one owned by `user_id`
    pub project_id: Option<Uuid>,

    /// Title, 1-200 characters
    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    pub due_date: Option<DateTime<Utc>>,

    /// Free-form labels, no particular order
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTask {
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

/// Partial update of a task
///
/// Absent fields are left unchanged. `description`, `due_date` and
/// `project_id` accept an explicit `null` to clear the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    #[serde(default)]
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

impl UpdateTask {
    /// Project the update moves the task into, if it names one
    pub fn target_project(&self) -> Option<Uuid> {
        self.project_id.flatten()
    }

    /// Applies the present fields to `task` and stamps `updated_at`
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        task.updated_at = now;
    }
}

impl Task {
    /// Builds a task record for `owner_id` from creation input
    pub fn from_new(owner_id: Uuid, data: CreateTask, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner_id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            tags: data.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Has a due date strictly before `now` and is not done
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < now)
    }

    /// Marks the task done in memory
    ///
    /// `updated_at` only moves when the status actually changes.
    pub fn mark_done(&mut self, now: DateTime<Utc>) {
        if self.status != TaskStatus::Done {
            self.status = TaskStatus::Done;
            self.updated_at = now;
        }
    }

    /// Inserts a new task owned by `owner_id`
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation on `tasks_project_owner_fkey` if
    /// `project_id` names a project not owned by `owner_id`.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        data: CreateTask,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO tasks (user_id, project_id, title, description, status, priority, \
             due_date, tags, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.tags)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Finds a task by id, only if owned by `owner_id`
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(executor)
            .await
    }

    /// Lists the owner's tasks matching `filter`, in the filter's sort order
    pub async fn query(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        filter: &TaskFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = filter.to_select(owner_id, now);
        query.build_query_as::<Task>().fetch_all(executor).await
    }

    /// Updates the present fields of an owned task
    ///
    /// Returns `None` if the task does not exist or is not owned.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateTask,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE tasks SET updated_at = ");
        query.push_bind(now);

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = data.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(tags) = data.tags {
            query.push(", tags = ").push_bind(tags);
        }
        if let Some(project_id) = data.project_id {
            query.push(", project_id = ").push_bind(project_id);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(owner_id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        query
            .build_query_as::<Task>()
            .fetch_optional(executor)
            .await
    }

    /// Marks an owned task done
    ///
    /// Idempotent: completing a done task returns it unchanged, including its
    /// `updated_at`. Returns `None` if the task does not exist or is not owned.
    pub async fn complete(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE tasks \
             SET status = 'done', \
                 updated_at = CASE WHEN status = 'done' THEN updated_at ELSE $3 END \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Deletes an owned task
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(now: DateTime<Utc>) -> Task {
        Task::from_new(
            Uuid::new_v4(),
            CreateTask {
                title: "Write report".to_string(),
                ..Default::default()
            },
            now,
        )
    }

    #[test]
    fn test_defaults() {
        let t = task(Utc::now());
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.priority, TaskPriority::Medium);
        assert!(t.tags.is_empty());
        assert_eq!(t.project_id, None);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("finished".parse::<TaskStatus>().is_err());
        assert!("Done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_semantic_order() {
        assert!(TaskPriority::Low < TaskPriority::Medium);
        assert!(TaskPriority::Medium < TaskPriority::High);
        assert_eq!("high".parse::<TaskPriority>(), Ok(TaskPriority::High));
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let mut t = task(now);
        assert!(!t.is_overdue(now));

        t.due_date = Some(now - Duration::days(1));
        assert!(t.is_overdue(now));

        t.due_date = Some(now);
        assert!(!t.is_overdue(now), "due exactly now is not overdue");

        t.due_date = Some(now - Duration::days(1));
        t.status = TaskStatus::Done;
        assert!(!t.is_overdue(now));
    }

    #[test]
    fn test_mark_done_is_idempotent() {
        let created = Utc::now();
        let mut t = task(created);
        let first = created + Duration::minutes(1);
        let second = created + Duration::minutes(2);

        t.mark_done(first);
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.updated_at, first);

        t.mark_done(second);
        assert_eq!(t.updated_at, first);
    }

    #[test]
    fn test_update_null_clears_and_absent_keeps() {
        let now = Utc::now();
        let mut t = task(now);
        t.description = Some("draft".to_string());
        t.due_date = Some(now);
        t.project_id = Some(Uuid::new_v4());

        let update: UpdateTask =
            serde_json::from_str(r#"{"due_date": null, "project_id": null, "priority": "high"}"#)
                .unwrap();
        assert_eq!(update.target_project(), None);
        update.apply(&mut t, now);

        assert_eq!(t.description.as_deref(), Some("draft"));
        assert_eq!(t.due_date, None);
        assert_eq!(t.project_id, None);
        assert_eq!(t.priority, TaskPriority::High);
    }
}
