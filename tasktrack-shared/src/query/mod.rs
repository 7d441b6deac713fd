//! Task query engine
//!
//! A [`TaskFilter`] is the validated form of a task list request: optional
//! criteria combined conjunctively plus a sort. It has two interpretations
//! that must agree:
//!
//! - [`TaskFilter::to_select`] compiles it to a parameterized Postgres query
//!   (all caller values bound, never interpolated)
//! - [`TaskFilter::matches`] / [`TaskFilter::compare`] evaluate it in memory
//!
//! Raw HTTP parameters arrive as [`TaskQueryParams`] and are converted with
//! `TryFrom`, rejecting unknown enum values, malformed ids and unknown sort
//! keys before any store access.
//!
//! # Example
//!
//! ```
//! use tasktrack_shared::query::{SortField, TaskFilter, TaskQueryParams};
//! use tasktrack_shared::models::task::TaskStatus;
//!
//! let params = TaskQueryParams {
//!     status: Some("todo".to_string()),
//!     tags: Some("work, urgent".to_string()),
//!     sort_by: Some("due_date".to_string()),
//!     ..Default::default()
//! };
//!
//! let filter = TaskFilter::try_from(params).unwrap();
//! assert_eq!(filter.status, Some(TaskStatus::Todo));
//! assert_eq!(filter.tags, vec!["work", "urgent"]);
//! assert_eq!(filter.sort.field, SortField::DueDate);
//! ```

mod eval;
mod sql;

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::{TaskPriority, TaskStatus};

/// Query-string value selecting tasks without a project
pub const UNASSIGNED_PROJECT: &str = "none";

/// Which project a task must belong to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectScope {
    /// No constraint
    #[default]
    Any,

    /// Only tasks with no project
    Unassigned,

    /// Only tasks in this project
    Project(Uuid),
}

/// Sort key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    DueDate,
    Priority,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortField::CreatedAt),
            "due_date" => Ok(SortField::DueDate),
            "priority" => Ok(SortField::Priority),
            other => Err(format!(
                "expected one of created_at, due_date, priority; got '{}'",
                other
            )),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Orients an ascending comparison
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("expected one of asc, desc; got '{}'", other)),
        }
    }
}

/// Sort specification; defaults to newest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Validated task query
///
/// Every present criterion must hold. Results are always additionally scoped
/// to the requesting owner by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub project: ProjectScope,

    /// The task must carry every one of these tags
    pub tags: Vec<String>,

    /// Only tasks due strictly before `now` that are not done
    pub overdue: bool,

    /// Case-insensitive substring of title or description
    pub search: Option<String>,

    pub sort: TaskSort,
}

impl TaskFilter {
    /// All tasks of one project, newest first
    pub fn for_project(project_id: Uuid) -> Self {
        Self {
            project: ProjectScope::Project(project_id),
            ..Default::default()
        }
    }
}

/// Raw task list query-string parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQueryParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
    /// Comma-separated tag list
    pub tags: Option<String>,
    pub overdue: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// A query parameter that failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for '{field}': {message}")]
pub struct FilterError {
    /// Offending parameter name
    pub field: &'static str,
    pub message: String,
}

impl FilterError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Treats blank values as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Keeps a non-blank value exactly as given
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_field<T>(field: &'static str, value: Option<String>) -> Result<Option<T>, FilterError>
where
    T: FromStr<Err = String>,
{
    present(value)
        .map(|v| v.parse::<T>().map_err(|message| FilterError::new(field, message)))
        .transpose()
}

fn parse_bool(field: &'static str, value: Option<String>) -> Result<bool, FilterError> {
    match present(value).as_deref() {
        None => Ok(false),
        Some("true" | "1") => Ok(true),
        Some("false" | "0") => Ok(false),
        Some(other) => Err(FilterError::new(
            field,
            format!("expected true or false; got '{}'", other),
        )),
    }
}

fn parse_project(value: Option<String>) -> Result<ProjectScope, FilterError> {
    match present(value) {
        None => Ok(ProjectScope::Any),
        Some(v) if v.eq_ignore_ascii_case(UNASSIGNED_PROJECT) => Ok(ProjectScope::Unassigned),
        Some(v) => Uuid::parse_str(&v)
            .map(ProjectScope::Project)
            .map_err(|_| FilterError::new("project_id", format!("not a valid UUID: '{}'", v))),
    }
}

/// Splits a comma-separated tag list, dropping blanks and duplicates
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

impl TryFrom<TaskQueryParams> for TaskFilter {
    type Error = FilterError;

    fn try_from(params: TaskQueryParams) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_field("status", params.status)?,
            priority: parse_field("priority", params.priority)?,
            project: parse_project(params.project_id)?,
            tags: present(params.tags).map(|t| parse_tags(&t)).unwrap_or_default(),
            overdue: parse_bool("overdue", params.overdue)?,
            search: non_blank(params.search),
            sort: TaskSort {
                field: parse_field("sort_by", params.sort_by)?.unwrap_or_default(),
                order: parse_field("sort_order", params.sort_order)?.unwrap_or_default(),
            },
        })
    }
}
