use std::collections::HashMap;

use event_bus::{Event, Handler, HandlerError};

use super::tracked::TrackedTasks;
use crate::events::{TaskEvent, TaskEventBus, TaskPayload, TaskTopic};
use crate::models::TaskId;

/// Status token a task must carry to be tracked
pub const IN_PROGRESS: &str = "IN_PROGRESS";

/// Tasks whose last seen status is exactly `IN_PROGRESS`.
///
/// Fed by `TASK_CREATED` and `STATUS_CHANGED`. A missing status counts as
/// "not in progress".
#[derive(Clone)]
pub struct InProgressTasks {
    inner: TrackedTasks,
}

impl InProgressTasks {
    pub const NAME: &'static str = "in_progress_tasks";

    /// Create the view and subscribe it to `bus`.
    pub fn new(bus: &mut TaskEventBus) -> Self {
        let view = Self {
            inner: TrackedTasks::new(Self::NAME, is_in_progress),
        };
        bus.subscribe(TaskTopic::TaskCreated, view.clone());
        bus.subscribe(TaskTopic::StatusChanged, view.clone());
        view
    }

    /// Snapshot of tracked payloads keyed by task id
    pub fn tasks(&self) -> HashMap<TaskId, TaskPayload> {
        self.inner.snapshot()
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskPayload> {
        self.inner.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.inner.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Handler<TaskEvent> for InProgressTasks {
    fn handle(&self, event: &Event<TaskEvent>) -> Result<(), HandlerError> {
        self.inner.apply(event)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

fn is_in_progress(payload: &TaskPayload) -> bool {
    payload.status.as_deref() == Some(IN_PROGRESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publish(bus: &TaskEventBus, event: TaskEvent) {
        assert!(bus.publish(event).is_clean());
    }

    #[test]
    fn test_tracks_last_status_only() {
        let mut bus = TaskEventBus::new();
        let view = InProgressTasks::new(&mut bus);
        let id = TaskId::from(1u64);

        publish(
            &bus,
            TaskEvent::TaskCreated(TaskPayload::new(1u64).with_status("IN_PROGRESS")),
        );
        assert!(view.contains(&id));

        publish(
            &bus,
            TaskEvent::StatusChanged(TaskPayload::new(1u64).with_status("DONE")),
        );
        assert!(!view.contains(&id));
        assert!(view.is_empty());
    }

    #[test]
    fn test_status_match_is_case_sensitive() {
        let mut bus = TaskEventBus::new();
        let view = InProgressTasks::new(&mut bus);

        publish(
            &bus,
            TaskEvent::TaskCreated(TaskPayload::new("t1").with_status("in_progress")),
        );

        assert!(view.is_empty());
    }

    #[test]
    fn test_missing_status_removes() {
        let mut bus = TaskEventBus::new();
        let view = InProgressTasks::new(&mut bus);

        publish(
            &bus,
            TaskEvent::TaskCreated(TaskPayload::new("t1").with_status("IN_PROGRESS")),
        );
        publish(&bus, TaskEvent::TaskCreated(TaskPayload::new("t1")));

        assert!(view.is_empty());
    }

    #[test]
    fn test_stores_full_payload() {
        let mut bus = TaskEventBus::new();
        let view = InProgressTasks::new(&mut bus);
        let payload = TaskPayload::new("t1")
            .with_status("IN_PROGRESS")
            .with_field("title", "Write docs");

        publish(&bus, TaskEvent::StatusChanged(payload.clone()));

        assert_eq!(view.get(&TaskId::from("t1")), Some(payload));
    }

    #[test]
    fn test_ignores_priority_events() {
        let mut bus = TaskEventBus::new();
        let view = InProgressTasks::new(&mut bus);

        publish(
            &bus,
            TaskEvent::PriorityChanged(TaskPayload::new("t1").with_status("IN_PROGRESS")),
        );

        assert!(view.is_empty());
        assert_eq!(bus.subscriber_count(TaskTopic::PriorityChanged), 0);
    }
}
