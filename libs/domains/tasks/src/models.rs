use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::EnumString;
use uuid::Uuid;
use validator::Validate;

/// Date format used by `created` / `updated` fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Task identifier
///
/// Upstream data uses both string (`"t1"`) and integer (`1`) ids. Both
/// deserialize into the same textual id; ids always serialize as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawTaskId", into = "String")]
pub struct TaskId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawTaskId> for TaskId {
    fn from(raw: RawTaskId) -> Self {
        match raw {
            RawTaskId::Text(id) => TaskId(id),
            RawTaskId::Signed(id) => TaskId(id.to_string()),
            RawTaskId::Unsigned(id) => TaskId(id.to_string()),
        }
    }
}

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    /// Fresh time-ordered id for tasks created without one
    pub fn generate() -> Self {
        TaskId(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId(id)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId(id.to_string())
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Task status
///
/// The four board columns are known; anything else is kept verbatim in
/// `Other` so open-ended upstream statuses survive a round trip. Matching is
/// case-sensitive: `"DONE"` is `Other("DONE")`, not `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// Task not started
    #[default]
    Todo,
    /// Task in progress
    InProgress,
    /// Waiting for review
    Review,
    /// Task completed
    Done,
    /// Any other status string
    #[strum(default)]
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Other(status) => status,
        }
    }

    /// Token carried in event payloads (`IN_PROGRESS`, `DONE`, ...)
    pub fn event_token(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TaskStatus {
    fn from(status: String) -> Self {
        status.parse().unwrap_or(TaskStatus::Other(status))
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

/// Task priority levels, matched case-sensitively like [`TaskStatus`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    Low,
    /// Default priority
    #[default]
    Medium,
    High,
    Critical,
    /// Any other priority string
    #[strum(default)]
    Other(String),
}

impl TaskPriority {
    pub fn as_str(&self) -> &str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
            TaskPriority::Other(priority) => priority,
        }
    }

    /// Token carried in event payloads (`CRITICAL`, `LOW`, ...)
    pub fn event_token(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TaskPriority {
    fn from(priority: String) -> Self {
        priority.parse().unwrap_or(TaskPriority::Other(priority))
    }
}

impl From<TaskPriority> for String {
    fn from(priority: TaskPriority) -> Self {
        match priority {
            TaskPriority::Other(priority) => priority,
            known => known.as_str().to_string(),
        }
    }
}

/// Task entity
///
/// Records are never edited in place: every mutation builds a new `Task`
/// through one of the `with_*` methods and the old value is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Owning project
    pub project_id: String,
    /// Task title
    pub title: String,
    /// Task description
    #[serde(default, alias = "desc")]
    pub description: String,
    /// Task status
    #[serde(default)]
    pub status: TaskStatus,
    /// Task priority
    #[serde(default)]
    pub priority: TaskPriority,
    /// Assigned user id
    #[serde(default)]
    pub assignee: Option<String>,
    /// Kind of work (`bug`, `feature`, ...), used to classify bugs
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Creation date (`YYYY-MM-DD`)
    pub created: String,
    /// Last update date (`YYYY-MM-DD`)
    pub updated: String,
}

impl Task {
    /// New record with `status` changed and `updated` set to `today`
    pub fn with_status(&self, status: TaskStatus, today: NaiveDate) -> Self {
        Self {
            status,
            updated: format_date(today),
            ..self.clone()
        }
    }

    /// New record with `priority` changed and `updated` set to `today`
    pub fn with_priority(&self, priority: TaskPriority, today: NaiveDate) -> Self {
        Self {
            priority,
            updated: format_date(today),
            ..self.clone()
        }
    }

    /// New record with `assignee` changed and `updated` set to `today`
    pub fn with_assignee(&self, assignee: Option<String>, today: NaiveDate) -> Self {
        Self {
            assignee,
            updated: format_date(today),
            ..self.clone()
        }
    }

    /// `updated` parsed as a date, `None` when malformed
    pub fn updated_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.updated, DATE_FORMAT).ok()
    }

    /// `created` parsed as a date, `None` when malformed
    pub fn created_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.created, DATE_FORMAT).ok()
    }

    /// Whether the task is a bug (case-insensitive on `type`)
    pub fn is_bug(&self) -> bool {
        self.task_type
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("bug"))
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// DTO for creating a new task
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTask {
    /// Explicit id; generated when absent
    #[serde(default)]
    pub id: Option<TaskId>,
    #[validate(length(min = 1, max = 128))]
    pub project_id: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
}

impl CreateTask {
    /// Build the stored record, stamping both dates with `today`
    pub fn into_task(self, today: NaiveDate) -> Task {
        let date = format_date(today);
        Task {
            id: self.id.unwrap_or_else(TaskId::generate),
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            assignee: self.assignee,
            task_type: self.task_type,
            created: date.clone(),
            updated: date,
        }
    }
}

/// DTO for adding a comment to a task
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    pub task_id: TaskId,
    #[validate(length(min = 1, max = 64))]
    pub author: String,
    #[validate(length(min = 1, max = 4000))]
    pub text: String,
}

/// Query filters for listing tasks
///
/// Every set field must match. Date bounds compare the `created` string
/// lexically, which is chronological for `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub exclude_status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

impl TaskFilter {
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn excluding_status(mut self, status: TaskStatus) -> Self {
        self.exclude_status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn created_between(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.created_from = Some(from.into());
        self.created_to = Some(to.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.project_id
            .as_ref()
            .is_none_or(|project| &task.project_id == project)
            && self.status.as_ref().is_none_or(|status| &task.status == status)
            && self
                .exclude_status
                .as_ref()
                .is_none_or(|status| &task.status != status)
            && self
                .priority
                .as_ref()
                .is_none_or(|priority| &task.priority == priority)
            && self
                .assignee
                .as_ref()
                .is_none_or(|assignee| task.assignee.as_ref() == Some(assignee))
            && self
                .created_from
                .as_ref()
                .is_none_or(|from| task.created.as_str() >= from.as_str())
            && self
                .created_to
                .as_ref()
                .is_none_or(|to| task.created.as_str() <= to.as_str())
    }
}
