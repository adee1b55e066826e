//! Tasks Domain
//!
//! Task records, the events they produce, the views derived from those
//! events and the concurrent project overview.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      publish       ┌─────────────┐
//! │  TaskBoard  │ ─────────────────▶ │  Event bus  │ ──▶ InProgressTasks
//! └──────┬──────┘                    └─────────────┘ ──▶ CriticalBugs
//!        │                                           ──▶ ActiveComments
//! ┌──────▼──────┐   ┌────────────────────┐
//! │ Repository  │   │ OverviewAggregator │  ← status / assignee / priority
//! └──────┬──────┘   └────────────────────┘    passes run concurrently
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tasks::{
//!     BoardViews, InMemoryTaskRepository, TaskBoard, TaskEventBus, TaskFilter, ViewsConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut bus = TaskEventBus::named("board");
//! let views = BoardViews::attach(&mut bus, &ViewsConfig::default())?;
//!
//! let board = TaskBoard::new(InMemoryTaskRepository::new(), bus);
//! let overview = board.overview(TaskFilter::default()).await?;
//! println!("{} in progress, {:?}", views.in_progress.len(), overview.by_status);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod memory;
pub mod models;
pub mod overview;
pub mod repository;
pub mod seed;
pub mod service;
pub mod views;

// Re-export commonly used types
pub use error::{TaskError, TaskResult};
pub use events::{CommentPayload, TaskEvent, TaskEventBus, TaskPayload, TaskTopic};
pub use memory::InMemoryTaskRepository;
pub use models::{
    CreateTask, NewComment, Task, TaskFilter, TaskId, TaskPriority, TaskStatus,
};
pub use overview::{Breakdown, OverviewAggregator, OverviewConfig, ProjectOverview, Tally};
pub use repository::TaskRepository;
pub use seed::SeedDocument;
pub use service::TaskBoard;
pub use views::{ActiveComments, BoardViews, CriticalBugs, InProgressTasks, ViewsConfig};
