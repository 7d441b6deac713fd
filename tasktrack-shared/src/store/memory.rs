//! In-memory [`Store`]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{NewUser, User};
use crate::query::TaskFilter;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
}

impl State {
    fn owns_project(&self, owner_id: Uuid, project_id: Uuid) -> bool {
        self.projects
            .get(&project_id)
            .is_some_and(|p| p.user_id == owner_id)
    }

    fn owned_task_mut(&mut self, owner_id: Uuid, id: Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(&id).filter(|t| t.user_id == owner_id)
    }
}

/// [`Store`] holding everything in process memory
///
/// Enforces the same uniqueness, ownership and cascade rules as the Postgres
/// schema. Data is lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, data: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict("Username already registered".to_string()));
        }
        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let user = User::from_new(data, now);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn insert_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
        now: DateTime<Utc>,
    ) -> Result<Project, StoreError> {
        let project = Project::from_new(owner_id, data, now);
        self.state
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Project>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .get(&id)
            .filter(|p| p.user_id == owner_id)
            .cloned())
    }

    async fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.user_id == owner_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn update_project(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateProject,
        now: DateTime<Utc>,
    ) -> Result<Option<Project>, StoreError> {
        let mut state = self.state.write().await;
        let Some(project) = state.projects.get_mut(&id).filter(|p| p.user_id == owner_id) else {
            return Ok(None);
        };

        data.apply(project, now);
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, owner_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if !state.owns_project(owner_id, id) {
            return Ok(false);
        }

        state.projects.remove(&id);
        state.tasks.retain(|_, t| t.project_id != Some(id));
        Ok(true)
    }

    async fn insert_task(
        &self,
        owner_id: Uuid,
        data: CreateTask,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let mut state = self.state.write().await;

        if let Some(project_id) = data.project_id {
            if !state.owns_project(owner_id, project_id) {
                return Err(StoreError::ProjectNotFound);
            }
        }

        let task = Task::from_new(owner_id, data, now);
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).filter(|t| t.user_id == owner_id).cloned())
    }

    async fn query_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        let state = self.state.read().await;
        let owned = state
            .tasks
            .values()
            .filter(|t| t.user_id == owner_id)
            .cloned();
        Ok(filter.apply(owned, now))
    }

    async fn update_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateTask,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.write().await;

        // Project first, matching the Postgres store
        if let Some(project_id) = data.target_project() {
            if !state.owns_project(owner_id, project_id) {
                return Err(StoreError::ProjectNotFound);
            }
        }

        let Some(task) = state.owned_task_mut(owner_id, id) else {
            return Ok(None);
        };
        data.apply(task, now);
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, owner_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.owned_task_mut(owner_id, id).is_none() {
            return Ok(false);
        }

        state.tasks.remove(&id);
        Ok(true)
    }

    async fn complete_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.owned_task_mut(owner_id, id).map(|task| {
            task.mark_done(now);
            task.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use chrono::Duration;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
        }
    }

    fn new_task(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_conflict() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert_user(new_user("alice"), now).await.unwrap();

        let same_name = store.insert_user(
            NewUser {
                email: "other@example.com".to_string(),
                ..new_user("alice")
            },
            now,
        );
        assert!(matches!(same_name.await, Err(StoreError::Conflict(_))));

        let same_email = store.insert_user(
            NewUser {
                username: "alice2".to_string(),
                ..new_user("alice")
            },
            now,
        );
        assert!(matches!(same_email.await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_foreign_rows_are_invisible() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let task = store.insert_task(alice, new_task("secret"), now).await.unwrap();

        assert!(store.find_task(bob, task.id).await.unwrap().is_none());
        assert!(store.complete_task(bob, task.id, now).await.unwrap().is_none());
        assert!(store
            .update_task(bob, task.id, UpdateTask::default(), now)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_task(bob, task.id).await.unwrap());
        assert!(store
            .query_tasks(bob, &TaskFilter::default(), now)
            .await
            .unwrap()
            .is_empty());

        // untouched for the owner
        let mine = store.find_task(alice, task.id).await.unwrap().unwrap();
        assert_eq!(mine.status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_task_cannot_reference_foreign_project() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let bobs = store
            .insert_project(bob, CreateProject { name: "Bob's".to_string(), ..Default::default() }, now)
            .await
            .unwrap();

        let create = store
            .insert_task(
                alice,
                CreateTask {
                    project_id: Some(bobs.id),
                    ..new_task("sneaky")
                },
                now,
            )
            .await;
        assert!(matches!(create, Err(StoreError::ProjectNotFound)));

        let task = store.insert_task(alice, new_task("mine"), now).await.unwrap();
        let moved = store
            .update_task(
                alice,
                task.id,
                UpdateTask {
                    project_id: Some(Some(bobs.id)),
                    ..Default::default()
                },
                now,
            )
            .await;
        assert!(matches!(moved, Err(StoreError::ProjectNotFound)));

        let missing = store
            .update_task(
                alice,
                Uuid::new_v4(),
                UpdateTask {
                    project_id: Some(Some(bobs.id)),
                    ..Default::default()
                },
                now,
            )
            .await;
        assert!(matches!(missing, Err(StoreError::ProjectNotFound)));
    }

    #[tokio::test]
    async fn test_delete_project_cascades_to_tasks() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let project = store
            .insert_project(owner, CreateProject { name: "Work".to_string(), ..Default::default() }, now)
            .await
            .unwrap();
        let inside = store
            .insert_task(
                owner,
                CreateTask {
                    project_id: Some(project.id),
                    ..new_task("inside")
                },
                now,
            )
            .await
            .unwrap();
        let outside = store.insert_task(owner, new_task("outside"), now).await.unwrap();

        assert!(store.delete_project(owner, project.id).await.unwrap());

        assert!(store.find_task(owner, inside.id).await.unwrap().is_none());
        assert!(store.find_task(owner, outside.id).await.unwrap().is_some());
        assert!(!store.delete_project(owner, project.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_keeps_updated_at_on_repeat() {
        let store = MemoryStore::new();
        let created = Utc::now();
        let owner = Uuid::new_v4();
        let task = store.insert_task(owner, new_task("t"), created).await.unwrap();

        let first = created + Duration::minutes(1);
        let done = store.complete_task(owner, task.id, first).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(done.updated_at, first);

        let again = store
            .complete_task(owner, task.id, created + Duration::minutes(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.updated_at, first);
    }

    #[tokio::test]
    async fn test_projects_listed_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let owner = Uuid::new_v4();
        for (i, name) in ["first", "second", "third"].iter().enumerate() {
            store
                .insert_project(
                    owner,
                    CreateProject { name: name.to_string(), ..Default::default() },
                    now + Duration::seconds(i as i64),
                )
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_projects(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }
}
