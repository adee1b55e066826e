//! Project overview: three tallies computed concurrently and joined.
//!
//! Each breakdown runs as its own tokio task over a shared, read-only copy of
//! the input. The overview is returned only once every pass has finished; the
//! first failing pass fails the whole call and the remaining passes are
//! aborted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use core_config::{ConfigError, FromEnv, env_flag, env_parse};
use domain_users::UserDirectory;
use metrics::histogram;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::error::{TaskError, TaskResult};
use crate::models::Task;

/// Multiset count keyed by the breakdown value
pub type Tally = BTreeMap<String, usize>;

/// The dimensions an overview counts tasks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Breakdown {
    Status,
    Assignee,
    Priority,
}

impl Breakdown {
    /// Key a task is counted under
    fn key<'a>(&self, task: &'a Task, users: &'a UserDirectory) -> &'a str {
        match self {
            Breakdown::Status => task.status.as_str(),
            Breakdown::Assignee => users.display_name(task.assignee.as_deref()),
            Breakdown::Priority => task.priority.as_str(),
        }
    }

    /// Count `tasks` along this breakdown
    pub fn tally(&self, tasks: &[Task], users: &UserDirectory) -> Tally {
        let mut counts = Tally::new();
        for task in tasks {
            *counts.entry(self.key(task, users).to_string()).or_default() += 1;
        }
        counts
    }
}

/// Joined result of the three passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectOverview {
    pub by_status: Tally,
    pub by_assignee: Tally,
    pub by_priority: Tally,
}

impl ProjectOverview {
    pub fn get(&self, breakdown: Breakdown) -> &Tally {
        match breakdown {
            Breakdown::Status => &self.by_status,
            Breakdown::Assignee => &self.by_assignee,
            Breakdown::Priority => &self.by_priority,
        }
    }

    fn set(&mut self, breakdown: Breakdown, tally: Tally) {
        match breakdown {
            Breakdown::Status => self.by_status = tally,
            Breakdown::Assignee => self.by_assignee = tally,
            Breakdown::Priority => self.by_priority = tally,
        }
    }

    /// Number of tasks counted (every task lands in exactly one status bucket)
    pub fn total(&self) -> usize {
        self.by_status.values().sum()
    }
}

/// Aggregator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewConfig {
    /// Simulated latency of each pass
    pub pass_latency: Duration,
    /// Drop tasks whose status is `done` before counting
    pub exclude_done: bool,
    /// Upper bound on a single pass
    pub pass_timeout: Option<Duration>,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            pass_latency: Duration::from_millis(10),
            exclude_done: false,
            pass_timeout: None,
        }
    }
}

impl OverviewConfig {
    pub fn with_pass_latency(mut self, latency: Duration) -> Self {
        self.pass_latency = latency;
        self
    }

    pub fn with_exclude_done(mut self, exclude_done: bool) -> Self {
        self.exclude_done = exclude_done;
        self
    }

    pub fn with_pass_timeout(mut self, timeout: Duration) -> Self {
        self.pass_timeout = Some(timeout);
        self
    }
}

impl FromEnv for OverviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let pass_latency = env_parse::<u64>("OVERVIEW_PASS_LATENCY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.pass_latency);
        let exclude_done = env_flag("OVERVIEW_EXCLUDE_DONE", defaults.exclude_done)?;
        let pass_timeout = env_parse::<u64>("OVERVIEW_PASS_TIMEOUT_MS")?;

        if pass_timeout == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "OVERVIEW_PASS_TIMEOUT_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            pass_latency,
            exclude_done,
            pass_timeout: pass_timeout.map(Duration::from_millis),
        })
    }
}

/// Fan-out/fan-in project overview
#[derive(Debug, Clone, Default)]
pub struct OverviewAggregator {
    config: OverviewConfig,
}

impl OverviewAggregator {
    pub fn new(config: OverviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverviewConfig {
        &self.config
    }

    /// Count `tasks` by status, assignee display name and priority.
    ///
    /// # Errors
    ///
    /// `TaskError::Aggregation` naming the breakdown whose pass panicked or
    /// timed out. No partial overview is returned.
    pub async fn project_overview(
        &self,
        tasks: &[Task],
        users: &UserDirectory,
    ) -> TaskResult<ProjectOverview> {
        self.run(tasks, users, None).await
    }

    /// Like [`Self::project_overview`], but gives up as soon as `shutdown`
    /// flips to `true`, aborting every in-flight pass.
    ///
    /// A closed shutdown channel never cancels.
    pub async fn project_overview_until(
        &self,
        tasks: &[Task],
        users: &UserDirectory,
        shutdown: watch::Receiver<bool>,
    ) -> TaskResult<ProjectOverview> {
        self.run(tasks, users, Some(shutdown)).await
    }

    #[instrument(
        name = "project_overview",
        skip_all,
        fields(tasks = tasks.len(), users = users.len(), exclude_done = self.config.exclude_done)
    )]
    async fn run(
        &self,
        tasks: &[Task],
        users: &UserDirectory,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> TaskResult<ProjectOverview> {
        let started = Instant::now();

        let input: Arc<[Task]> = tasks
            .iter()
            .filter(|task| !(self.config.exclude_done && task.status.is_done()))
            .cloned()
            .collect();
        let users = Arc::new(users.clone());

        // Dropping the set aborts whatever is still running.
        let mut passes = JoinSet::new();
        let mut spawned = HashMap::new();
        for breakdown in Breakdown::iter() {
            let handle = passes.spawn(run_pass(
                breakdown,
                Arc::clone(&input),
                Arc::clone(&users),
                self.config.clone(),
            ));
            spawned.insert(handle.id(), breakdown);
        }
        debug!(counted = input.len(), "Spawned overview passes");

        let result = tokio::select! {
            joined = join_passes(&mut passes, &spawned) => joined,
            _ = cancelled(shutdown) => {
                Err(TaskError::Cancelled("project overview".to_string()))
            }
        };
        drop(passes);

        let elapsed = started.elapsed();
        let outcome = match &result {
            Ok(overview) => {
                info!(
                    counted = overview.total(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Project overview complete"
                );
                "success"
            }
            Err(TaskError::Cancelled(_)) => {
                info!("Project overview cancelled");
                "cancelled"
            }
            Err(e) => {
                warn!(error = %e, "Project overview failed");
                "failed"
            }
        };
        histogram!("task_overview_duration_seconds", "outcome" => outcome)
            .record(elapsed.as_secs_f64());

        result
    }
}

async fn run_pass(
    breakdown: Breakdown,
    tasks: Arc<[Task]>,
    users: Arc<UserDirectory>,
    config: OverviewConfig,
) -> TaskResult<(Breakdown, Tally)> {
    let pass = async {
        tokio::time::sleep(config.pass_latency).await;
        breakdown.tally(&tasks, &users)
    };

    let tally = match config.pass_timeout {
        Some(limit) => tokio::time::timeout(limit, pass).await.map_err(|_| {
            TaskError::aggregation(breakdown, format!("timed out after {:?}", limit))
        })?,
        None => pass.await,
    };

    debug!(%breakdown, buckets = tally.len(), "Overview pass finished");
    Ok((breakdown, tally))
}

async fn join_passes(
    passes: &mut JoinSet<TaskResult<(Breakdown, Tally)>>,
    spawned: &HashMap<tokio::task::Id, Breakdown>,
) -> TaskResult<ProjectOverview> {
    let mut overview = ProjectOverview::default();

    while let Some(joined) = passes.join_next().await {
        let (breakdown, tally) = match joined {
            Ok(result) => result?,
            Err(err) => return Err(join_failure(err, spawned)),
        };
        overview.set(breakdown, tally);
    }

    Ok(overview)
}

fn join_failure(err: JoinError, spawned: &HashMap<tokio::task::Id, Breakdown>) -> TaskError {
    let Some(&breakdown) = spawned.get(&err.id()) else {
        return TaskError::Internal(format!("unknown overview pass failed: {}", err));
    };

    if err.is_panic() {
        let panic = err.into_panic();
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        TaskError::aggregation(breakdown, format!("pass panicked: {}", message))
    } else {
        TaskError::aggregation(breakdown, "pass was cancelled")
    }
}

/// Resolves once `shutdown` carries `true`; never resolves without a channel
/// or after the sender is dropped.
async fn cancelled(shutdown: Option<watch::Receiver<bool>>) {
    let Some(mut shutdown) = shutdown else {
        return std::future::pending().await;
    };

    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskId, TaskPriority, TaskStatus};
    use domain_users::{Role, User};

    fn task(id: &str, status: TaskStatus, assignee: Option<&str>) -> Task {
        Task {
            id: TaskId::from(id),
            project_id: "p1".into(),
            title: format!("Task {}", id),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            assignee: assignee.map(String::from),
            task_type: None,
            created: "2025-01-01".into(),
            updated: "2025-01-01".into(),
        }
    }

    fn fast() -> OverviewAggregator {
        OverviewAggregator::new(OverviewConfig::default().with_pass_latency(Duration::ZERO))
    }

    #[test]
    fn test_tally_by_status() {
        let tasks = vec![
            task("1", TaskStatus::Done, None),
            task("2", TaskStatus::Todo, None),
            task("3", TaskStatus::Done, None),
        ];

        let tally = Breakdown::Status.tally(&tasks, &UserDirectory::new());

        assert_eq!(tally.get("done"), Some(&2));
        assert_eq!(tally.get("todo"), Some(&1));
        assert_eq!(tally.len(), 2);
    }

    #[test]
    fn test_breakdown_names() {
        assert_eq!(Breakdown::Assignee.to_string(), "assignee");
        assert_eq!(Breakdown::iter().count(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_tallies() {
        let overview = fast()
            .project_overview(&[], &UserDirectory::new())
            .await
            .unwrap();

        assert_eq!(overview, ProjectOverview::default());
        assert_eq!(overview.total(), 0);
    }

    #[tokio::test]
    async fn test_unknown_assignee_bucket() {
        let users = UserDirectory::from_users(vec![User::new("u1", "Alice", Role::Admin)]);
        let tasks = vec![
            task("1", TaskStatus::Todo, Some("u1")),
            task("2", TaskStatus::Todo, Some("ghost")),
            task("3", TaskStatus::Todo, None),
        ];

        let overview = fast().project_overview(&tasks, &users).await.unwrap();

        assert_eq!(overview.by_assignee.get("Alice"), Some(&1));
        assert_eq!(overview.by_assignee.get("unknown"), Some(&2));
        assert!(!overview.by_assignee.contains_key("ghost"));
    }

    #[tokio::test]
    async fn test_exclude_done_stage() {
        let tasks = vec![
            task("1", TaskStatus::Done, None),
            task("2", TaskStatus::InProgress, None),
        ];
        let aggregator = OverviewAggregator::new(
            OverviewConfig::default()
                .with_pass_latency(Duration::ZERO)
                .with_exclude_done(true),
        );

        let overview = aggregator
            .project_overview(&tasks, &UserDirectory::new())
            .await
            .unwrap();

        assert_eq!(overview.by_status.get("done"), None);
        assert_eq!(overview.by_status.get("in_progress"), Some(&1));
        assert_eq!(overview.by_priority.get("medium"), Some(&1));
    }

    #[tokio::test]
    async fn test_status_tally_keeps_each_spelling() {
        let tasks: Vec<Task> = ["DONE", "done", "In_Progress"]
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                task(&i.to_string(), TaskStatus::from(status.to_string()), None)
            })
            .collect();

        let overview = fast().project_overview(&tasks, &UserDirectory::new()).await.unwrap();

        assert_eq!(overview.by_status.get("DONE"), Some(&1));
        assert_eq!(overview.by_status.get("done"), Some(&1));
        assert_eq!(overview.by_status.get("In_Progress"), Some(&1));
        assert_eq!(overview.by_status.len(), 3);

        let filtered = OverviewAggregator::new(
            OverviewConfig::default()
                .with_pass_latency(Duration::ZERO)
                .with_exclude_done(true),
        )
        .project_overview(&tasks, &UserDirectory::new())
        .await
        .unwrap();

        assert_eq!(filtered.by_status.get("done"), None);
        assert_eq!(filtered.by_status.get("DONE"), Some(&1));
        assert_eq!(filtered.total(), 2);
    }

    #[tokio::test]
    async fn test_pass_timeout_fails_whole_overview() {
        let aggregator = OverviewAggregator::new(
            OverviewConfig::default()
                .with_pass_latency(Duration::from_millis(500))
                .with_pass_timeout(Duration::from_millis(10)),
        );

        let err = aggregator
            .project_overview(&[task("1", TaskStatus::Todo, None)], &UserDirectory::new())
            .await
            .unwrap_err();

        assert!(err.breakdown().is_some());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_cancellation_returns_cancelled() {
        let aggregator = OverviewAggregator::new(
            OverviewConfig::default().with_pass_latency(Duration::from_secs(30)),
        );
        let (tx, rx) = watch::channel(false);

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).ok();
        });

        let started = Instant::now();
        let err = aggregator
            .project_overview_until(&[task("1", TaskStatus::Todo, None)], &UserDirectory::new(), rx)
            .await
            .unwrap_err();
        cancel.await.unwrap();

        assert!(matches!(err, TaskError::Cancelled(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_closed_shutdown_channel_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let overview = fast()
            .project_overview_until(&[task("1", TaskStatus::Todo, None)], &UserDirectory::new(), rx)
            .await
            .unwrap();

        assert_eq!(overview.total(), 1);
    }

    #[tokio::test]
    async fn test_panicking_pass_names_breakdown() {
        let mut set: JoinSet<()> = JoinSet::new();
        let handle = set.spawn(async { panic!("tally exploded") });
        let spawned = HashMap::from([(handle.id(), Breakdown::Priority)]);

        let err = set.join_next().await.unwrap().unwrap_err();
        let err = join_failure(err, &spawned);

        assert_eq!(err.breakdown(), Some(Breakdown::Priority));
        assert!(err.to_string().contains("tally exploded"));
    }
}
