use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use domain_users::UserDirectory;
use event_bus::PublishReport;
use futures::future::try_join_all;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use validator::Validate;

use crate::error::{TaskError, TaskResult};
use crate::events::{CommentPayload, TaskEvent, TaskEventBus, TaskPayload};
use crate::models::{
    CreateTask, NewComment, Task, TaskFilter, TaskId, TaskPriority, TaskStatus, format_date,
};
use crate::overview::{OverviewAggregator, ProjectOverview};
use crate::repository::TaskRepository;

/// Orchestrates task mutations, the event bus and the overview.
///
/// Every successful mutation is stored first and then published; a view
/// that rejects the event never rolls the mutation back.
pub struct TaskBoard<R: TaskRepository> {
    repository: Arc<R>,
    bus: Arc<TaskEventBus>,
    aggregator: OverviewAggregator,
    users: UserDirectory,
}

impl<R: TaskRepository> TaskBoard<R> {
    /// Build a board over `repository`, publishing to `bus`.
    ///
    /// Views must already be attached to the bus.
    pub fn new(repository: R, bus: TaskEventBus) -> Self {
        Self {
            repository: Arc::new(repository),
            bus: Arc::new(bus),
            aggregator: OverviewAggregator::default(),
            users: UserDirectory::new(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: OverviewAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_users(mut self, users: UserDirectory) -> Self {
        self.users = users;
        self
    }

    pub fn bus(&self) -> &TaskEventBus {
        &self.bus
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Validate, store and announce a new task (`TASK_CREATED`).
    #[instrument(skip(self, input), fields(project_id = %input.project_id))]
    pub async fn create_task(&self, input: CreateTask) -> TaskResult<Task> {
        input.validate()?;

        let task = self.repository.insert(input.into_task(today())).await?;
        self.publish(TaskEvent::TaskCreated(TaskPayload::from(&task)));
        Ok(task)
    }

    /// Get a task by id
    pub async fn get_task(&self, id: &TaskId) -> TaskResult<Task> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| TaskError::NotFound(id.clone()))
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> TaskResult<Vec<Task>> {
        self.repository.list(filter).await
    }

    /// Replace the task's status and publish `STATUS_CHANGED`.
    #[instrument(skip(self, id), fields(task_id = %id, status = %status))]
    pub async fn change_status(&self, id: &TaskId, status: TaskStatus) -> TaskResult<Task> {
        let current = self.get_task(id).await?;
        let task = self
            .repository
            .replace(current.with_status(status, today()))
            .await?;
        self.publish(TaskEvent::StatusChanged(TaskPayload::from(&task)));
        Ok(task)
    }

    /// Replace the task's priority and publish `PRIORITY_CHANGED`.
    #[instrument(skip(self, id), fields(task_id = %id, priority = %priority))]
    pub async fn change_priority(&self, id: &TaskId, priority: TaskPriority) -> TaskResult<Task> {
        let current = self.get_task(id).await?;
        let task = self
            .repository
            .replace(current.with_priority(priority, today()))
            .await?;
        self.publish(TaskEvent::PriorityChanged(TaskPayload::from(&task)));
        Ok(task)
    }

    /// Publish `COMMENT_ADDED` for an existing task.
    ///
    /// Comments are not stored; the comments view is their only home.
    #[instrument(skip(self, comment), fields(task_id = %comment.task_id))]
    pub async fn add_comment(&self, comment: NewComment) -> TaskResult<CommentPayload> {
        comment.validate()?;
        self.get_task(&comment.task_id).await?;

        let payload = CommentPayload::new()
            .with_field("task_id", comment.task_id.as_str())
            .with_field("author", comment.author)
            .with_field("text", comment.text)
            .with_field("created", format_date(today()));
        self.publish(TaskEvent::CommentAdded(payload.clone()));
        Ok(payload)
    }

    /// Set the same status on every task in `ids`.
    ///
    /// Reads and writes run concurrently. Events are published afterwards,
    /// one per task, in the order of `ids`. If any task is missing nothing is
    /// written.
    #[instrument(skip(self, ids), fields(count = ids.len(), status = %status))]
    pub async fn bulk_update_status(
        &self,
        ids: &[TaskId],
        status: TaskStatus,
    ) -> TaskResult<Vec<Task>> {
        let today = today();

        let current = try_join_all(ids.iter().map(|id| self.get_task(id))).await?;
        let updated = try_join_all(current.iter().map(|task| {
            self.repository
                .replace(task.with_status(status.clone(), today))
        }))
        .await?;

        for task in &updated {
            self.publish(TaskEvent::StatusChanged(TaskPayload::from(task)));
        }
        debug!(updated = updated.len(), "Bulk status update done");
        Ok(updated)
    }

    /// Overview of every task matching `filter`.
    pub async fn overview(&self, filter: TaskFilter) -> TaskResult<ProjectOverview> {
        let tasks = self.repository.list(filter).await?;
        self.aggregator.project_overview(&tasks, &self.users).await
    }

    /// Overview that gives up when `shutdown` flips to `true`.
    pub async fn overview_until(
        &self,
        filter: TaskFilter,
        shutdown: watch::Receiver<bool>,
    ) -> TaskResult<ProjectOverview> {
        let tasks = self.repository.list(filter).await?;
        self.aggregator
            .project_overview_until(&tasks, &self.users, shutdown)
            .await
    }

    /// Find open tasks untouched for more than `max_days` and publish
    /// `TASK_OVERDUE` for each.
    ///
    /// Tasks with an unparseable `updated` date are skipped.
    #[instrument(skip(self))]
    pub async fn overdue_scan(&self, max_days: i64, today: NaiveDate) -> TaskResult<Vec<Task>> {
        let open = self
            .repository
            .list(TaskFilter::default().excluding_status(TaskStatus::Done))
            .await?;

        let mut overdue = Vec::new();
        for task in open {
            let Some(updated) = task.updated_date() else {
                warn!(task_id = %task.id, updated = %task.updated, "Skipping task with malformed date");
                continue;
            };
            if (today - updated).num_days() > max_days {
                overdue.push(task);
            }
        }

        for task in &overdue {
            self.publish(TaskEvent::TaskOverdue(TaskPayload::from(task)));
        }
        Ok(overdue)
    }

    /// Publish an already-typed event.
    pub fn publish(&self, event: TaskEvent) -> PublishReport {
        let report = self.bus.publish(event);
        if !report.is_clean() {
            warn!(
                topic = %report.topic,
                failed = report.failures.len(),
                subscribers = report.subscribers,
                "Event not applied by every view"
            );
        }
        report
    }

    /// Validate a raw `(topic, payload)` pair and publish it.
    pub fn publish_json(&self, topic: &str, payload: Value) -> TaskResult<PublishReport> {
        let event = TaskEvent::from_json(topic, payload)?;
        Ok(self.publish(event))
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
