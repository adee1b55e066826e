//! Derived views over the task event stream.
//!
//! Each view is a cheap `Clone` handle: the copy subscribed to the bus and
//! the copy held by the caller share state. Views are only written from
//! inside `EventBus::publish`.

mod comments;
mod critical_bugs;
mod in_progress;
mod tracked;

pub use comments::ActiveComments;
pub use critical_bugs::CriticalBugs;
pub use in_progress::{IN_PROGRESS, InProgressTasks};

use core_config::{ConfigError, FromEnv, env_parse};

use crate::error::TaskResult;
use crate::events::TaskEventBus;

/// View settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewsConfig {
    /// Window size of [`ActiveComments`]
    pub active_comments_limit: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            active_comments_limit: ActiveComments::DEFAULT_LIMIT,
        }
    }
}

impl FromEnv for ViewsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let active_comments_limit = env_parse::<usize>("ACTIVE_COMMENTS_LIMIT")?
            .unwrap_or(ActiveComments::DEFAULT_LIMIT);

        if active_comments_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ACTIVE_COMMENTS_LIMIT".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            active_comments_limit,
        })
    }
}

/// The three board views, wired to one bus
#[derive(Clone)]
pub struct BoardViews {
    pub in_progress: InProgressTasks,
    pub critical_bugs: CriticalBugs,
    pub comments: ActiveComments,
}

impl BoardViews {
    /// Create every view and subscribe it to `bus`.
    pub fn attach(bus: &mut TaskEventBus, config: &ViewsConfig) -> TaskResult<Self> {
        Ok(Self {
            in_progress: InProgressTasks::new(bus),
            critical_bugs: CriticalBugs::new(bus),
            comments: ActiveComments::with_limit(bus, config.active_comments_limit)?,
        })
    }
}
