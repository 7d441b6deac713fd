//! Postgres-backed [`Store`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db::pool::health_check;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{NewUser, User};
use crate::query::TaskFilter;

/// [`Store`] over a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await.map_err(StoreError::from)
    }

    async fn insert_user(&self, data: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, data, now).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn insert_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
        now: DateTime<Utc>,
    ) -> Result<Project, StoreError> {
        Ok(Project::create(&self.pool, owner_id, data, now).await?)
    }

    async fn find_project(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(Project::find_by_id(&self.pool, owner_id, id).await?)
    }

    async fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError> {
        Ok(Project::list_by_owner(&self.pool, owner_id).await?)
    }

    async fn update_project(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateProject,
        now: DateTime<Utc>,
    ) -> Result<Option<Project>, StoreError> {
        Ok(Project::update(&self.pool, owner_id, id, data, now).await?)
    }

    async fn delete_project(&self, owner_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        Ok(Project::delete(&self.pool, owner_id, id).await?)
    }

    async fn insert_task(
        &self,
        owner_id: Uuid,
        data: CreateTask,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(project_id) = data.project_id {
            if Project::find_by_id(&mut *tx, owner_id, project_id).await?.is_none() {
                return Err(StoreError::ProjectNotFound);
            }
        }

        let task = Task::create(&mut *tx, owner_id, data, now).await?;
        tx.commit().await?;

        Ok(task)
    }

    async fn find_task(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, owner_id, id).await?)
    }

    async fn query_tasks(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        Ok(Task::query(&self.pool, owner_id, filter, now).await?)
    }

    async fn update_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateTask,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(project_id) = data.target_project() {
            if Project::find_by_id(&mut *tx, owner_id, project_id).await?.is_none() {
                return Err(StoreError::ProjectNotFound);
            }
        }

        let task = Task::update(&mut *tx, owner_id, id, data, now).await?;
        tx.commit().await?;

        Ok(task)
    }

    async fn delete_task(&self, owner_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, owner_id, id).await?)
    }

    async fn complete_task(
        &self,
        owner_id: Uuid,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        Ok(Task::complete(&self.pool, owner_id, id, now).await?)
    }
}
