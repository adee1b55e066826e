use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use event_bus::{Event, Handler, HandlerError};

use crate::error::{TaskError, TaskResult};
use crate::events::{CommentPayload, TaskEvent, TaskEventBus, TaskTopic};

/// Sliding window over the most recent `COMMENT_ADDED` payloads.
///
/// Holds at most `limit` payloads in arrival order; the oldest is dropped
/// first once the window is full.
#[derive(Clone)]
pub struct ActiveComments {
    limit: usize,
    window: Arc<RwLock<VecDeque<CommentPayload>>>,
}

impl ActiveComments {
    pub const NAME: &'static str = "active_comments";
    pub const DEFAULT_LIMIT: usize = 10;

    /// Create the view with the default limit and subscribe it to `bus`.
    pub fn new(bus: &mut TaskEventBus) -> Self {
        Self::subscribed(bus, Self::DEFAULT_LIMIT)
    }

    /// Create the view with a custom window size.
    ///
    /// # Errors
    ///
    /// A limit of zero is rejected with `TaskError::Validation`.
    pub fn with_limit(bus: &mut TaskEventBus, limit: usize) -> TaskResult<Self> {
        if limit == 0 {
            return Err(TaskError::Validation(
                "active comments limit must be at least 1".to_string(),
            ));
        }
        Ok(Self::subscribed(bus, limit))
    }

    fn subscribed(bus: &mut TaskEventBus, limit: usize) -> Self {
        let view = Self {
            limit,
            window: Arc::new(RwLock::new(VecDeque::new())),
        };
        bus.subscribe(TaskTopic::CommentAdded, view.clone());
        view
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshot of the window, oldest first
    pub fn comments(&self) -> Vec<CommentPayload> {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Handler<TaskEvent> for ActiveComments {
    fn handle(&self, event: &Event<TaskEvent>) -> Result<(), HandlerError> {
        let TaskEvent::CommentAdded(comment) = &event.payload else {
            return Err(HandlerError::rejected(format!(
                "{} is not a comment event",
                event.topic
            )));
        };

        let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
        window.push_back(comment.clone());
        while window.len() > self.limit {
            window.pop_front();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(n: usize) -> TaskEvent {
        TaskEvent::CommentAdded(CommentPayload::new().with_field("n", n))
    }

    #[test]
    fn test_keeps_last_n_in_arrival_order() {
        let mut bus = TaskEventBus::new();
        let view = ActiveComments::with_limit(&mut bus, 3).unwrap();

        for n in 0..7 {
            bus.publish(comment(n));
        }

        let seen: Vec<_> = view
            .comments()
            .iter()
            .map(|c| c.get("n").and_then(|v| v.as_u64()).unwrap())
            .collect();
        assert_eq!(seen, vec![4, 5, 6]);
    }

    #[test]
    fn test_default_limit() {
        let mut bus = TaskEventBus::new();
        let view = ActiveComments::new(&mut bus);

        for n in 0..25 {
            bus.publish(comment(n));
        }

        assert_eq!(view.limit(), 10);
        assert_eq!(view.len(), 10);
        assert_eq!(
            view.comments()[0].get("n").and_then(|v| v.as_u64()),
            Some(15)
        );
    }

    #[test]
    fn test_fewer_than_limit() {
        let mut bus = TaskEventBus::new();
        let view = ActiveComments::with_limit(&mut bus, 5).unwrap();

        bus.publish(comment(1));
        bus.publish(comment(2));

        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut bus = TaskEventBus::new();

        let result = ActiveComments::with_limit(&mut bus, 0);

        assert!(matches!(result, Err(TaskError::Validation(_))));
        assert_eq!(bus.subscriber_count(TaskTopic::CommentAdded), 0);
    }

    #[test]
    fn test_huge_limit_allocates_lazily() {
        let mut bus = TaskEventBus::new();
        let view = ActiveComments::with_limit(&mut bus, usize::MAX).unwrap();

        for n in 0..3 {
            bus.publish(comment(n));
        }

        assert_eq!(view.limit(), usize::MAX);
        assert_eq!(view.len(), 3);
    }
}
