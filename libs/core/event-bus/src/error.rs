//! Handler and publish error types
//!
//! Handler failures never abort a publish. They are collected per invocation:
//! - **Error**: the handler returned `Err(HandlerError)`
//! - **Panicked**: the handler panicked; the panic message is captured

use thiserror::Error;

/// Error returned by a handler that could not process an event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The payload lacks a field the handler needs
    #[error("Missing field: {0}")]
    MissingField(String),

    /// The payload was understood but rejected
    #[error("Rejected event: {0}")]
    Rejected(String),

    /// Any other failure inside the handler
    #[error("Handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        HandlerError::MissingField(field.into())
    }

    /// Create a rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        HandlerError::Rejected(message.into())
    }

    /// Create a generic failure
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// How a single handler invocation failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    #[error("{0}")]
    Error(HandlerError),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl FailureKind {
    /// Short label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Error(_) => "error",
            FailureKind::Panicked(_) => "panic",
        }
    }
}

/// A failed handler invocation within one publish call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler '{handler}' (position {position}) failed: {kind}")]
pub struct HandlerFailure {
    /// Name reported by the handler
    pub handler: &'static str,
    /// Position of the subscription in the topic's subscriber list
    pub position: usize,
    /// What went wrong
    pub kind: FailureKind,
}

/// Error produced when a publish report is turned into a `Result`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("{} of {total} handlers failed for topic {topic}", failures.len())]
    HandlersFailed {
        topic: String,
        total: usize,
        failures: Vec<HandlerFailure>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_messages() {
        assert_eq!(
            HandlerError::missing_field("id").to_string(),
            "Missing field: id"
        );
        assert_eq!(
            HandlerError::rejected("stale").to_string(),
            "Rejected event: stale"
        );
    }

    #[test]
    fn test_failure_display_names_handler() {
        let failure = HandlerFailure {
            handler: "in_progress_tasks",
            position: 1,
            kind: FailureKind::Panicked("boom".to_string()),
        };

        let message = failure.to_string();
        assert!(message.contains("in_progress_tasks"));
        assert!(message.contains("panicked: boom"));
        assert_eq!(failure.kind.label(), "panic");
    }

    #[test]
    fn test_publish_error_counts_failures() {
        let err = PublishError::HandlersFailed {
            topic: "STATUS_CHANGED".to_string(),
            total: 3,
            failures: vec![HandlerFailure {
                handler: "audit",
                position: 0,
                kind: FailureKind::Error(HandlerError::failed("disk full")),
            }],
        };

        assert_eq!(
            err.to_string(),
            "1 of 3 handlers failed for topic STATUS_CHANGED"
        );
    }
}
