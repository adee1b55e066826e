use std::collections::HashMap;

use event_bus::{Event, Handler, HandlerError};

use super::tracked::TrackedTasks;
use crate::events::{TaskEvent, TaskEventBus, TaskPayload, TaskTopic};
use crate::models::TaskId;

/// Bugs whose last seen payload has `type == "BUG"` and `priority == "CRITICAL"`.
///
/// Fed by `TASK_CREATED` and `PRIORITY_CHANGED`. The predicate is re-evaluated
/// over the whole payload each time, so a `PRIORITY_CHANGED` event whose
/// `type` is no longer `BUG` drops the task even when the priority stayed
/// `CRITICAL`.
#[derive(Clone)]
pub struct CriticalBugs {
    inner: TrackedTasks,
}

impl CriticalBugs {
    pub const NAME: &'static str = "critical_bugs";

    /// Create the view and subscribe it to `bus`.
    pub fn new(bus: &mut TaskEventBus) -> Self {
        let view = Self {
            inner: TrackedTasks::new(Self::NAME, is_critical_bug),
        };
        bus.subscribe(TaskTopic::TaskCreated, view.clone());
        bus.subscribe(TaskTopic::PriorityChanged, view.clone());
        view
    }

    /// Snapshot of tracked payloads keyed by task id
    pub fn bugs(&self) -> HashMap<TaskId, TaskPayload> {
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

impl Handler<TaskEvent> for CriticalBugs {
    fn handle(&self, event: &Event<TaskEvent>) -> Result<(), HandlerError> {
        self.inner.apply(event)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

fn is_critical_bug(payload: &TaskPayload) -> bool {
    payload.kind.as_deref() == Some("BUG") && payload.priority.as_deref() == Some("CRITICAL")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn critical_bug(id: &str) -> TaskPayload {
        TaskPayload::new(id)
            .with_kind("BUG")
            .with_priority("CRITICAL")
    }

    #[test]
    fn test_requires_both_type_and_priority() {
        let mut bus = TaskEventBus::new();
        let view = CriticalBugs::new(&mut bus);

        bus.publish(TaskEvent::TaskCreated(critical_bug("b1")));
        bus.publish(TaskEvent::TaskCreated(
            TaskPayload::new("b2").with_kind("BUG").with_priority("HIGH"),
        ));
        bus.publish(TaskEvent::TaskCreated(
            TaskPayload::new("f1").with_kind("FEATURE").with_priority("CRITICAL"),
        ));
        bus.publish(TaskEvent::TaskCreated(
            TaskPayload::new("b3").with_priority("CRITICAL"),
        ));

        let bugs = view.bugs();
        assert_eq!(bugs.len(), 1);
        assert!(bugs.contains_key(&TaskId::from("b1")));
    }

    #[test]
    fn test_priority_downgrade_removes() {
        let mut bus = TaskEventBus::new();
        let view = CriticalBugs::new(&mut bus);

        bus.publish(TaskEvent::TaskCreated(critical_bug("b1")));
        bus.publish(TaskEvent::PriorityChanged(
            TaskPayload::new("b1").with_kind("BUG").with_priority("LOW"),
        ));

        assert!(view.is_empty());
    }

    #[test]
    fn test_type_change_under_priority_topic_removes() {
        let mut bus = TaskEventBus::new();
        let view = CriticalBugs::new(&mut bus);

        bus.publish(TaskEvent::TaskCreated(critical_bug("b1")));
        bus.publish(TaskEvent::PriorityChanged(
            TaskPayload::new("b1")
                .with_kind("TASK")
                .with_priority("CRITICAL"),
        ));

        assert!(!view.contains(&TaskId::from("b1")));
    }

    #[test]
    fn test_identical_publish_is_idempotent() {
        let mut bus = TaskEventBus::new();
        let view = CriticalBugs::new(&mut bus);
        let payload = critical_bug("b1").with_field("title", "Crash on save");

        bus.publish(TaskEvent::PriorityChanged(payload.clone()));
        let first = view.bugs();
        bus.publish(TaskEvent::PriorityChanged(payload));

        assert_eq!(view.bugs(), first);
    }

    #[test]
    fn test_status_events_are_not_routed() {
        let mut bus = TaskEventBus::new();
        let view = CriticalBugs::new(&mut bus);

        bus.publish(TaskEvent::StatusChanged(
            critical_bug("b1").with_status("TODO"),
        ));

        assert!(view.is_empty());
    }
}
