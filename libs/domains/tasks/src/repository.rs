use async_trait::async_trait;

use crate::error::TaskResult;
use crate::models::{Task, TaskFilter, TaskId};

/// Storage seam for task records
///
/// Records are replaced wholesale; there is no partial update.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Store a new task. Fails if the id is already taken.
    async fn insert(&self, task: Task) -> TaskResult<Task>;

    /// Get a task by id
    async fn get(&self, id: &TaskId) -> TaskResult<Option<Task>>;

    /// List tasks matching `filter`, in insertion order
    async fn list(&self, filter: TaskFilter) -> TaskResult<Vec<Task>>;

    /// Swap the stored record with the same id for `task`
    async fn replace(&self, task: Task) -> TaskResult<Task>;

    /// Count all tasks
    async fn count(&self) -> TaskResult<usize>;
}
