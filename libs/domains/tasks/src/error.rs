use domain_users::UserError;
use thiserror::Error;

use crate::models::TaskId;
use crate::overview::Breakdown;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid {topic} event: {reason}")]
    InvalidEvent { topic: String, reason: String },

    #[error("Overview failed in the {breakdown} breakdown: {message}")]
    Aggregation {
        breakdown: Breakdown,
        message: String,
    },

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Users(#[from] UserError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    pub fn invalid_event(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskError::InvalidEvent {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    pub fn aggregation(breakdown: Breakdown, message: impl Into<String>) -> Self {
        TaskError::Aggregation {
            breakdown,
            message: message.into(),
        }
    }

    /// The breakdown a failed overview stopped in, if any
    pub fn breakdown(&self) -> Option<Breakdown> {
        match self {
            TaskError::Aggregation { breakdown, .. } => Some(*breakdown),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        TaskError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for TaskError {
    fn from(err: validator::ValidationErrors) -> Self {
        TaskError::Validation(err.to_string())
    }
}
