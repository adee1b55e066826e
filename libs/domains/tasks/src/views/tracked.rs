//! Keyed projection shared by the task-tracking views.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use event_bus::{Event, HandlerError};
use tracing::trace;

use crate::events::{TaskEvent, TaskPayload};
use crate::models::TaskId;

/// Map of task id to the last qualifying payload.
///
/// Every routed payload is re-checked against `qualifies`: a match replaces
/// the stored entry wholesale, a miss removes it. Nothing is merged.
#[derive(Clone)]
pub(crate) struct TrackedTasks {
    view: &'static str,
    qualifies: fn(&TaskPayload) -> bool,
    entries: Arc<RwLock<HashMap<TaskId, TaskPayload>>>,
}

impl TrackedTasks {
    pub(crate) fn new(view: &'static str, qualifies: fn(&TaskPayload) -> bool) -> Self {
        Self {
            view,
            qualifies,
            entries: Arc::default(),
        }
    }

    pub(crate) fn apply(&self, event: &Event<TaskEvent>) -> Result<(), HandlerError> {
        let payload = event
            .payload
            .task()
            .ok_or_else(|| HandlerError::rejected(format!("{} carries no task", event.topic)))?;

        let mut entries = self.write();
        if (self.qualifies)(payload) {
            trace!(view = self.view, task_id = %payload.id, "Tracking task");
            entries.insert(payload.id.clone(), payload.clone());
        } else if entries.remove(&payload.id).is_some() {
            trace!(view = self.view, task_id = %payload.id, "Task no longer qualifies");
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> HashMap<TaskId, TaskPayload> {
        self.read().clone()
    }

    pub(crate) fn get(&self, id: &TaskId) -> Option<TaskPayload> {
        self.read().get(id).cloned()
    }

    pub(crate) fn contains(&self, id: &TaskId) -> bool {
        self.read().contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    // A handler that panicked mid-update leaves a complete map behind, so a
    // poisoned lock is still safe to read.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, TaskPayload>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, TaskPayload>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
