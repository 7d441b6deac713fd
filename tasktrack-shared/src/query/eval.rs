//! In-memory evaluation of a [`TaskFilter`]
//!
//! Mirrors the SQL produced by [`TaskFilter::to_select`] so that any store
//! returns the same rows in the same order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::{ProjectScope, SortField, TaskFilter};
use crate::models::task::Task;

impl TaskFilter {
    /// Whether `task` satisfies every criterion at instant `now`
    ///
    /// Ownership is not part of the filter; callers scope by owner first.
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }

        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }

        let in_scope = match self.project {
            ProjectScope::Any => true,
            ProjectScope::Unassigned => task.project_id.is_none(),
            ProjectScope::Project(id) => task.project_id == Some(id),
        };
        if !in_scope {
            return false;
        }

        if !self.tags.iter().all(|tag| task.tags.contains(tag)) {
            return false;
        }

        if self.overdue && !task.is_overdue(now) {
            return false;
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&term);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }

    /// Total order of two tasks under this filter's sort
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let order = self.sort.order;

        let primary = match self.sort.field {
            SortField::CreatedAt => order.apply(a.created_at.cmp(&b.created_at)),
            SortField::Priority => order.apply(a.priority.cmp(&b.priority)),
            // Missing due dates go last in both directions
            SortField::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => order.apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Keeps the matching tasks and sorts them
    pub fn apply<I>(&self, tasks: I, now: DateTime<Utc>) -> Vec<Task>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut selected: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches(task, now))
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}
