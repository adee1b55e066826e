//! In-process task store.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{TaskError, TaskResult};
use crate::models::{Task, TaskFilter, TaskId};
use crate::repository::TaskRepository;

/// `TaskRepository` backed by a vector, preserving insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload records, e.g. from a seed document.
    ///
    /// # Errors
    ///
    /// `TaskError::Validation` if two records share an id.
    pub fn from_tasks(tasks: Vec<Task>) -> TaskResult<Self> {
        ensure_unique(&tasks)?;
        Ok(Self {
            tasks: RwLock::new(tasks),
        })
    }
}

pub(crate) fn ensure_unique(tasks: &[Task]) -> TaskResult<()> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(&task.id) {
            return Err(TaskError::Validation(format!(
                "duplicate task id: {}",
                task.id
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn insert(&self, task: Task) -> TaskResult<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(TaskError::Validation(format!(
                "task {} already exists",
                task.id
            )));
        }
        tasks.push(task.clone());
        debug!(total = tasks.len(), "Task stored");
        Ok(task)
    }

    async fn get(&self, id: &TaskId) -> TaskResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| &task.id == id).cloned())
    }

    async fn list(&self, filter: TaskFilter) -> TaskResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn replace(&self, task: Task) -> TaskResult<Task> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or_else(|| TaskError::NotFound(task.id.clone()))?;
        *slot = task.clone();
        Ok(task)
    }

    async fn count(&self) -> TaskResult<usize> {
        Ok(self.tasks.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: TaskId::from(id),
            project_id: "p1".into(),
            title: format!("Task {}", id),
            description: String::new(),
            status,
            priority: TaskPriority::Low,
            assignee: None,
            task_type: None,
            created: "2025-03-01".into(),
            updated: "2025-03-01".into(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = InMemoryTaskRepository::new();

        repo.insert(task("t1", TaskStatus::Todo)).await.unwrap();

        let found = repo.get(&TaskId::from("t1")).await.unwrap();
        assert_eq!(found.map(|t| t.title), Some("Task t1".to_string()));
        assert!(repo.get(&TaskId::from("t2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let repo = InMemoryTaskRepository::new();
        repo.insert(task("t1", TaskStatus::Todo)).await.unwrap();

        let result = repo.insert(task("t1", TaskStatus::Done)).await;

        assert!(matches!(result, Err(TaskError::Validation(_))));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let repo = InMemoryTaskRepository::new();

        let result = repo.replace(task("t1", TaskStatus::Todo)).await;

        assert!(matches!(result, Err(TaskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_order() {
        let repo = InMemoryTaskRepository::from_tasks(vec![
            task("t1", TaskStatus::Done),
            task("t2", TaskStatus::Todo),
            task("t3", TaskStatus::Done),
        ])
        .unwrap();

        let done = repo
            .list(TaskFilter::default().with_status(TaskStatus::Done))
            .await
            .unwrap();
        let ids: Vec<_> = done.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);

        let open = repo
            .list(TaskFilter::default().excluding_status(TaskStatus::Done))
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn test_from_tasks_rejects_duplicates() {
        let result = InMemoryTaskRepository::from_tasks(vec![
            task("t1", TaskStatus::Todo),
            task("t1", TaskStatus::Done),
        ]);

        assert!(matches!(result, Err(TaskError::Validation(_))));
    }
}
