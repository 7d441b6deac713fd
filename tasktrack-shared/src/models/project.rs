//! Project model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     name VARCHAR(200) NOT NULL,
//!     description TEXT,
//!     color CHAR(7),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT projects_id_user_id_key UNIQUE (id, user_id)
//! );
//! ```
//!
//! Deleting a project deletes its tasks (`ON DELETE CASCADE` on the tasks
//! foreign key).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::deserialize_some;

const PROJECT_COLUMNS: &str = "id, user_id, name, description, color, created_at, updated_at";

/// A named grouping of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Hex color, `#RRGGBB`
    pub color: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Partial update of a project
///
/// Absent fields are left unchanged; `description` and `color` accept an
/// explicit `null` to clear the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub color: Option<Option<String>>,
}

impl UpdateProject {
    /// Applies the present fields to `project` and stamps `updated_at`
    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(color) = self.color {
            project.color = color;
        }
        project.updated_at = now;
    }
}

impl Project {
    /// Builds a project record for `owner_id` from creation input
    pub fn from_new(owner_id: Uuid, data: CreateProject, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner_id,
            name: data.name,
            description: data.description,
            color: data.color,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts a new project owned by `owner_id`
    pub async fn create(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        data: CreateProject,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO projects (user_id, name, description, color, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(owner_id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.color)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Finds a project by id, only if owned by `owner_id`
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM projects WHERE id = $1 AND user_id = $2",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(executor)
            .await
    }

    /// Lists the owner's projects, newest first
    pub async fn list_by_owner(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM projects WHERE user_id = $1 ORDER BY created_at DESC, id ASC",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(owner_id)
            .fetch_all(executor)
            .await
    }

    /// Updates the present fields of an owned project
    ///
    /// Returns `None` if the project does not exist or is not owned.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateProject,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE projects SET updated_at = ");
        query.push_bind(now);

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(color) = data.color {
            query.push(", color = ").push_bind(color);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(owner_id)
            .push(" RETURNING ")
            .push(PROJECT_COLUMNS);

        query
            .build_query_as::<Project>()
            .fetch_optional(executor)
            .await
    }

    /// Deletes an owned project and, by cascade, its tasks
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(
        executor: impl PgExecutor<'_>,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
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

    fn project(now: DateTime<Utc>) -> Project {
        Project::from_new(
            Uuid::new_v4(),
            CreateProject {
                name: "Work".to_string(),
                description: Some("Day job".to_string()),
                color: Some("#112233".to_string()),
            },
            now,
        )
    }

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let update: UpdateProject = serde_json::from_str(r#"{"color": null}"#).unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.description, None);
        assert_eq!(update.color, Some(None));
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let created = Utc::now();
        let mut p = project(created);
        let later = created + chrono::Duration::minutes(5);

        let update: UpdateProject =
            serde_json::from_str(r#"{"name": "Home", "color": null}"#).unwrap();
        update.apply(&mut p, later);

        assert_eq!(p.name, "Home");
        assert_eq!(p.description.as_deref(), Some("Day job"));
        assert_eq!(p.color, None);
        assert_eq!(p.created_at, created);
        assert_eq!(p.updated_at, later);
    }
}
