//! Compilation of a [`TaskFilter`] to a Postgres `SELECT`

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ProjectScope, SortField, TaskFilter};
use crate::models::task::TASK_COLUMNS;

/// Escapes `LIKE` metacharacters so the term matches literally
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl TaskFilter {
    /// Builds the owner-scoped `SELECT` for this filter
    ///
    /// Every caller-supplied value is a bound parameter. Ties under the sort
    /// key are broken by `id ASC` so the order is total.
    pub fn to_select(&self, owner_id: Uuid, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new("SELECT ");
        query.push(TASK_COLUMNS).push(" FROM tasks WHERE user_id = ");
        query.push_bind(owner_id);

        if let Some(status) = self.status {
            query.push(" AND status = ").push_bind(status);
        }

        if let Some(priority) = self.priority {
            query.push(" AND priority = ").push_bind(priority);
        }

        match self.project {
            ProjectScope::Any => {}
            ProjectScope::Unassigned => {
                query.push(" AND project_id IS NULL");
            }
            ProjectScope::Project(project_id) => {
                query.push(" AND project_id = ").push_bind(project_id);
            }
        }

        if !self.tags.is_empty() {
            query.push(" AND tags @> ").push_bind(self.tags.clone());
        }

        if self.overdue {
            query
                .push(" AND due_date IS NOT NULL AND due_date < ")
                .push_bind(now)
                .push(" AND status <> 'done'");
        }

        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        let column = match self.sort.field {
            SortField::CreatedAt => "created_at",
            SortField::DueDate => "due_date",
            SortField::Priority => "priority",
        };
        query
            .push(" ORDER BY ")
            .push(column)
            .push(" ")
            .push(self.sort.order.as_sql());
        // Missing due dates go last in both directions
        if self.sort.field == SortField::DueDate {
            query.push(" NULLS LAST");
        }
        query.push(", id ASC");

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::query::{SortOrder, TaskSort};

    const SELECT: &str = "SELECT id, user_id, project_id, title, description, status, \
         priority, due_date, tags, created_at, updated_at FROM tasks WHERE user_id = $1";

    fn sql(filter: &TaskFilter) -> String {
        filter.to_select(Uuid::new_v4(), Utc::now()).sql().to_string()
    }

    #[test]
    fn test_default_filter_is_owner_scoped_newest_first() {
        assert_eq!(
            sql(&TaskFilter::default()),
            format!("{} ORDER BY created_at DESC, id ASC", SELECT)
        );
    }

    #[test]
    fn test_all_criteria_are_bound() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Todo),
            priority: Some(TaskPriority::High),
            project: ProjectScope::Project(Uuid::new_v4()),
            tags: vec!["work".to_string()],
            overdue: true,
            search: Some("report".to_string()),
            sort: TaskSort {
                field: SortField::Priority,
                order: SortOrder::Asc,
            },
        };

        assert_eq!(
            sql(&filter),
            format!(
                "{} AND status = $2 AND priority = $3 AND project_id = $4 AND tags @> $5 \
                 AND due_date IS NOT NULL AND due_date < $6 AND status <> 'done' \
                 AND (title ILIKE $7 OR description ILIKE $8) \
                 ORDER BY priority ASC, id ASC",
                SELECT
            )
        );
    }

    #[test]
    fn test_unassigned_and_due_date_sort() {
        let filter = TaskFilter {
            project: ProjectScope::Unassigned,
            sort: TaskSort {
                field: SortField::DueDate,
                order: SortOrder::Desc,
            },
            ..Default::default()
        };

        assert_eq!(
            sql(&filter),
            format!(
                "{} AND project_id IS NULL ORDER BY due_date DESC NULLS LAST, id ASC",
                SELECT
            )
        );
    }

    #[test]
    fn test_search_text_never_reaches_sql() {
        let filter = TaskFilter {
            search: Some("'; DROP TABLE tasks; --".to_string()),
            ..Default::default()
        };

        assert!(!sql(&filter).contains("DROP"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
