//! Task operations on behalf of an authenticated user
//!
//! Thin layer over [`Store`] that turns "absent or not owned" into
//! [`TaskError::NotFound`] and re-asserts ownership on everything a query
//! returns.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use tasktrack_shared::models::task::{CreateTask, TaskStatus};
//! use tasktrack_shared::query::TaskFilter;
//! use tasktrack_shared::store::MemoryStore;
//! use tasktrack_shared::tasks;
//! use uuid::Uuid;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tasks::TaskError> {
//! let store = MemoryStore::new();
//! let owner = Uuid::new_v4();
//! let now = Utc::now();
//!
//! let task = tasks::create_task(&store, owner, CreateTask {
//!     title: "Write report".to_string(),
//!     ..Default::default()
//! }, now).await?;
//!
//! let done = tasks::complete_task(&store, owner, task.id, now).await?;
//! assert_eq!(done.status, TaskStatus::Done);
//!
//! let open = TaskFilter { status: Some(TaskStatus::Todo), ..Default::default() };
//! assert!(tasks::query_tasks(&store, owner, &open, now).await?.is_empty());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::authorization::retain_owned;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::query::TaskFilter;
use crate::store::{Store, StoreError};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task is absent or owned by someone else
    #[error("Task not found")]
    NotFound,

    /// The referenced project is absent or owned by someone else
    #[error("Project not found")]
    ProjectNotFound,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProjectNotFound => TaskError::ProjectNotFound,
            other => TaskError::Store(other),
        }
    }
}

pub async fn create_task(
    store: &dyn Store,
    owner_id: Uuid,
    data: CreateTask,
    now: DateTime<Utc>,
) -> Result<Task, TaskError> {
    let task = store.insert_task(owner_id, data, now).await?;
    tracing::info!(task_id = %task.id, project_id = ?task.project_id, "Task created");
    Ok(task)
}

pub async fn get_task(store: &dyn Store, owner_id: Uuid, id: Uuid) -> Result<Task, TaskError> {
    store.find_task(owner_id, id).await?.ok_or(TaskError::NotFound)
}

/// Lists the owner's tasks matching `filter`
///
/// A filter naming another user's project simply matches nothing.
pub async fn query_tasks(
    store: &dyn Store,
    owner_id: Uuid,
    filter: &TaskFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Task>, TaskError> {
    let mut tasks = store.query_tasks(owner_id, filter, now).await?;
    retain_owned(owner_id, &mut tasks, |t| t.user_id);

    tracing::debug!(
        count = tasks.len(),
        status = ?filter.status,
        priority = ?filter.priority,
        project = ?filter.project,
        tags = filter.tags.len(),
        overdue = filter.overdue,
        searching = filter.search.is_some(),
        sort = ?filter.sort,
        "Task query"
    );

    Ok(tasks)
}

/// Lists the tasks of one of the owner's projects, newest first
pub async fn project_tasks(
    store: &dyn Store,
    owner_id: Uuid,
    project_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Task>, TaskError> {
    if store.find_project(owner_id, project_id).await?.is_none() {
        return Err(TaskError::ProjectNotFound);
    }

    query_tasks(store, owner_id, &TaskFilter::for_project(project_id), now).await
}

pub async fn update_task(
    store: &dyn Store,
    owner_id: Uuid,
    id: Uuid,
    data: UpdateTask,
    now: DateTime<Utc>,
) -> Result<Task, TaskError> {
    let task = store
        .update_task(owner_id, id, data, now)
        .await?
        .ok_or(TaskError::NotFound)?;

    tracing::info!(task_id = %task.id, "Task updated");
    Ok(task)
}

pub async fn delete_task(store: &dyn Store, owner_id: Uuid, id: Uuid) -> Result<(), TaskError> {
    if !store.delete_task(owner_id, id).await? {
        return Err(TaskError::NotFound);
    }

    tracing::info!(task_id = %id, "Task deleted");
    Ok(())
}

/// Marks a task done
///
/// Completing an already-done task succeeds and leaves it untouched.
pub async fn complete_task(
    store: &dyn Store,
    owner_id: Uuid,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<Task, TaskError> {
    let task = store
        .complete_task(owner_id, id, now)
        .await?
        .ok_or(TaskError::NotFound)?;

    tracing::info!(task_id = %task.id, "Task completed");
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::CreateProject;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn titled(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_overdue_then_complete() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let now = at("2024-06-10T09:00:00Z");

        let report = create_task(
            &store,
            alice,
            CreateTask {
                priority: TaskPriority::High,
                due_date: Some(at("2024-06-01T00:00:00Z")),
                tags: vec!["work".to_string()],
                ..titled("Write report")
            },
            now - Duration::days(20),
        )
        .await
        .unwrap();
        create_task(&store, alice, titled("Someday"), now - Duration::days(20))
            .await
            .unwrap();

        let overdue = TaskFilter {
            overdue: true,
            ..Default::default()
        };
        let listed = query_tasks(&store, alice, &overdue, now).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, report.id);

        let done = complete_task(&store, alice, report.id, now).await.unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(done.updated_at, now);

        assert!(query_tasks(&store, alice, &overdue, now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_task_is_not_found() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let now = Utc::now();
        let task = create_task(&store, alice, titled("private"), now).await.unwrap();

        assert!(matches!(get_task(&store, bob, task.id).await, Err(TaskError::NotFound)));
        assert!(matches!(
            complete_task(&store, bob, task.id, now).await,
            Err(TaskError::NotFound)
        ));
        assert!(matches!(delete_task(&store, bob, task.id).await, Err(TaskError::NotFound)));
        assert!(matches!(
            update_task(&store, bob, task.id, UpdateTask::default(), now).await,
            Err(TaskError::NotFound)
        ));

        assert_eq!(get_task(&store, alice, task.id).await.unwrap().status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_project_tasks_requires_owned_project() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let now = Utc::now();
        let project = store
            .insert_project(alice, CreateProject { name: "Work".to_string(), ..Default::default() }, now)
            .await
            .unwrap();
        create_task(
            &store,
            alice,
            CreateTask {
                project_id: Some(project.id),
                ..titled("in project")
            },
            now,
        )
        .await
        .unwrap();
        create_task(&store, alice, titled("loose"), now).await.unwrap();

        let listed = project_tasks(&store, alice, project.id, now).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "in project");

        assert!(matches!(
            project_tasks(&store, bob, project.id, now).await,
            Err(TaskError::ProjectNotFound)
        ));
    }

    #[tokio::test]
    async fn test_create_with_foreign_project_rejected() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let now = Utc::now();
        let bobs = store
            .insert_project(bob, CreateProject { name: "Bob's".to_string(), ..Default::default() }, now)
            .await
            .unwrap();

        let result = create_task(
            &store,
            alice,
            CreateTask {
                project_id: Some(bobs.id),
                ..titled("sneaky")
            },
            now,
        )
        .await;
        assert!(matches!(result, Err(TaskError::ProjectNotFound)));

        // filtering on it just matches nothing
        let filter = TaskFilter::for_project(bobs.id);
        assert!(query_tasks(&store, alice, &filter, now).await.unwrap().is_empty());
    }
}
