//! Pure display-ready projections of tasks.

use std::fmt;

use chrono::{DateTime, Utc};
use taskdeck_core::model::{Priority, Task, TaskId, TaskStatus};

pub const NO_DUE_DATE: &str = "No due date";
pub const EMPTY_TITLE: &str = "No tasks found";
pub const EMPTY_HINT: &str = "Create your first task to get started";

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "Pending",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Completed => "Completed",
    }
}

pub fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

/// Short calendar date such as `Jan 5, 2025`, rendered in UTC.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => NO_DUE_DATE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: &'static str,
    pub priority: &'static str,
    pub due: String,
    pub created: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: status_label(task.status),
            priority: priority_label(task.priority),
            due: format_date(task.due_date),
            created: format_date(Some(task.created_at)),
        }
    }
}

impl fmt::Display for TaskRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  [{} | {}]  Due: {}",
            self.id, self.title, self.status, self.priority, self.due
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListProjection {
    Empty {
        title: &'static str,
        hint: &'static str,
    },
    Rows(Vec<TaskRow>),
}

impl ListProjection {
    pub fn is_empty(&self) -> bool {
        matches!(self, ListProjection::Empty { .. })
    }
}

pub fn project(tasks: &[Task]) -> ListProjection {
    if tasks.is_empty() {
        return ListProjection::Empty {
            title: EMPTY_TITLE,
            hint: EMPTY_HINT,
        };
    }
    ListProjection::Rows(tasks.iter().map(TaskRow::from).collect())
}
