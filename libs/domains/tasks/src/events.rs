//! Task events routed through the board's event bus.
//!
//! Payloads are typed per topic. Raw JSON maps coming from outside the crate
//! are validated once, in [`TaskEvent::from_json`]; views never see a payload
//! without an `id`.
//!
//! Event payloads carry upper-case tokens (`IN_PROGRESS`, `CRITICAL`, `BUG`)
//! and view predicates compare them exactly.

use std::str::FromStr;

use event_bus::{BusEvent, EventBus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{TaskError, TaskResult};
use crate::models::{Task, TaskId};

/// Bus carrying task events
pub type TaskEventBus = EventBus<TaskEvent>;

/// Topics published by the task board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskTopic {
    TaskCreated,
    StatusChanged,
    PriorityChanged,
    CommentAdded,
    TaskOverdue,
}

/// Task-shaped payload
///
/// Only `id` is required. `status`, `priority` and `type` are optional;
/// a view treats a missing field as "does not qualify". Every other field is
/// preserved verbatim in `extra`, so a stored payload equals the published one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskPayload {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            status: None,
            priority: None,
            kind: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl From<&Task> for TaskPayload {
    fn from(task: &Task) -> Self {
        let mut extra = Map::new();
        extra.insert("project_id".into(), Value::from(task.project_id.clone()));
        extra.insert("title".into(), Value::from(task.title.clone()));
        extra.insert(
            "assignee".into(),
            task.assignee.clone().map_or(Value::Null, Value::from),
        );
        extra.insert("updated".into(), Value::from(task.updated.clone()));

        Self {
            id: task.id.clone(),
            status: Some(task.status.event_token()),
            priority: Some(task.priority.event_token()),
            kind: task.task_type.as_deref().map(str::to_ascii_uppercase),
            extra,
        }
    }
}

/// Comment payload; any JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentPayload(pub Map<String, Value>);

impl CommentPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Event published on the task board bus, one variant per topic
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    TaskCreated(TaskPayload),
    StatusChanged(TaskPayload),
    PriorityChanged(TaskPayload),
    CommentAdded(CommentPayload),
    TaskOverdue(TaskPayload),
}

impl BusEvent for TaskEvent {
    type Topic = TaskTopic;

    fn topic(&self) -> TaskTopic {
        match self {
            TaskEvent::TaskCreated(_) => TaskTopic::TaskCreated,
            TaskEvent::StatusChanged(_) => TaskTopic::StatusChanged,
            TaskEvent::PriorityChanged(_) => TaskTopic::PriorityChanged,
            TaskEvent::CommentAdded(_) => TaskTopic::CommentAdded,
            TaskEvent::TaskOverdue(_) => TaskTopic::TaskOverdue,
        }
    }
}

impl TaskEvent {
    /// Validate a raw `(topic, payload)` pair from outside the crate.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidEvent` if the topic is unknown, the payload
    /// is not an object, `id` is missing or not a string/integer, a known
    /// field has the wrong type, or a `STATUS_CHANGED` payload lacks `status`.
    pub fn from_json(topic: &str, payload: Value) -> TaskResult<Self> {
        let topic = TaskTopic::from_str(topic)
            .map_err(|_| TaskError::invalid_event(topic, "unknown topic"))?;
        Self::from_topic(topic, payload)
    }

    /// Validate a raw payload for a known topic.
    pub fn from_topic(topic: TaskTopic, payload: Value) -> TaskResult<Self> {
        if !payload.is_object() {
            return Err(TaskError::invalid_event(
                topic.as_ref(),
                "payload must be a JSON object",
            ));
        }

        Ok(match topic {
            TaskTopic::CommentAdded => TaskEvent::CommentAdded(parse(topic, payload)?),
            TaskTopic::TaskCreated => TaskEvent::TaskCreated(parse(topic, payload)?),
            TaskTopic::StatusChanged => {
                let task: TaskPayload = parse(topic, payload)?;
                if task.status.is_none() {
                    return Err(TaskError::invalid_event(
                        topic.as_ref(),
                        "missing field `status`",
                    ));
                }
                TaskEvent::StatusChanged(task)
            }
            TaskTopic::PriorityChanged => TaskEvent::PriorityChanged(parse(topic, payload)?),
            TaskTopic::TaskOverdue => TaskEvent::TaskOverdue(parse(topic, payload)?),
        })
    }

    /// The task payload, for every topic except comments
    pub fn task(&self) -> Option<&TaskPayload> {
        match self {
            TaskEvent::TaskCreated(task)
            | TaskEvent::StatusChanged(task)
            | TaskEvent::PriorityChanged(task)
            | TaskEvent::TaskOverdue(task) => Some(task),
            TaskEvent::CommentAdded(_) => None,
        }
    }

    /// The payload as JSON, in the shape handlers outside Rust expect
    pub fn payload_json(&self) -> TaskResult<Value> {
        let value = match self {
            TaskEvent::CommentAdded(comment) => serde_json::to_value(comment)?,
            other => match other.task() {
                Some(task) => serde_json::to_value(task)?,
                None => Value::Null,
            },
        };
        Ok(value)
    }
}

fn parse<T: DeserializeOwned>(topic: TaskTopic, payload: Value) -> TaskResult<T> {
    serde_json::from_value(payload).map_err(|e| TaskError::invalid_event(topic.as_ref(), e.to_string()))
}
