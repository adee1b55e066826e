//! Board Overview
//!
//! Command-line orchestrator for the task board.
//!
//! ## Flow
//!
//! ```text
//! seed.json (tasks + users)
//!   ↓ SeedDocument::load
//! InMemoryTaskRepository + UserDirectory
//!   ↓ TASK_CREATED per task, then the overdue scan
//! TaskEventBus → InProgressTasks / CriticalBugs / ActiveComments
//!   ↓
//! OverviewAggregator (status / assignee / priority in parallel)
//!   ↓
//! JSON report on stdout
//! ```
//!
//! Ctrl+C or SIGTERM while the overview is running cancels every in-flight
//! pass and exits cleanly without a report.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use core_config::{ConfigError, Environment, FromEnv, env_or_default, env_parse};
use domain_tasks::{
    BoardViews, InMemoryTaskRepository, OverviewAggregator, OverviewConfig, ProjectOverview,
    SeedDocument, TaskBoard, TaskError, TaskEvent, TaskEventBus, TaskFilter, TaskId, TaskPayload,
    ViewsConfig,
};
use eyre::{Result, WrapErr};
use serde::Serialize;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Binary settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Seed document to load
    pub seed_path: PathBuf,
    /// Open tasks untouched for longer than this are reported overdue
    pub overdue_days: i64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from("data/seed.json"),
            overdue_days: 7,
        }
    }
}

impl FromEnv for BoardConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let seed_path = PathBuf::from(env_or_default(
            "BOARD_SEED_PATH",
            &defaults.seed_path.to_string_lossy(),
        ));
        let overdue_days = env_parse::<i64>("BOARD_OVERDUE_DAYS")?.unwrap_or(defaults.overdue_days);

        if overdue_days < 0 {
            return Err(ConfigError::InvalidValue {
                key: "BOARD_OVERDUE_DAYS".to_string(),
                details: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            seed_path,
            overdue_days,
        })
    }
}

/// What the binary prints
#[derive(Debug, Clone, Serialize)]
pub struct BoardReport {
    pub overview: ProjectOverview,
    pub in_progress: Vec<TaskId>,
    pub critical_bugs: Vec<TaskId>,
    pub overdue: Vec<TaskId>,
    pub recent_comments: usize,
}

/// Run the board overview
///
/// 1. Sets up color-eyre and structured logging (JSON for prod, pretty for dev)
/// 2. Loads configuration and the seed document
/// 3. Builds the report, cancelling on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if configuration is invalid, the seed document cannot be
/// loaded, or the overview fails.
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting board overview");

    let config = BoardConfig::from_env().wrap_err("Failed to load board configuration")?;
    let overview_config =
        OverviewConfig::from_env().wrap_err("Failed to load overview configuration")?;
    let views_config = ViewsConfig::from_env().wrap_err("Failed to load views configuration")?;
    info!(
        seed_path = %config.seed_path.display(),
        overdue_days = config.overdue_days,
        pass_latency_ms = overview_config.pass_latency.as_millis() as u64,
        exclude_done = overview_config.exclude_done,
        active_comments_limit = views_config.active_comments_limit,
        "Configuration loaded"
    );

    let seed = SeedDocument::load(&config.seed_path)
        .await
        .wrap_err_with(|| format!("Failed to load seed document {}", config.seed_path.display()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {}", e);
            return;
        }
        let _ = shutdown_tx.send(true);
    });

    let today = Utc::now().date_naive();
    let report = build_report(
        seed,
        &config,
        overview_config,
        &views_config,
        today,
        shutdown_rx,
    )
    .await?;

    match report {
        Some(report) => {
            let rendered =
                serde_json::to_string_pretty(&report).wrap_err("Failed to render report")?;
            println!("{}", rendered);
            info!("Board overview finished");
        }
        None => info!("Board overview cancelled, no report produced"),
    }

    Ok(())
}

/// Wire a board from `seed`, replay it through the views and aggregate.
///
/// Returns `Ok(None)` when `shutdown` fires before the overview completes.
pub async fn build_report(
    seed: SeedDocument,
    config: &BoardConfig,
    overview_config: OverviewConfig,
    views_config: &ViewsConfig,
    today: NaiveDate,
    shutdown: watch::Receiver<bool>,
) -> Result<Option<BoardReport>> {
    let (repository, users) = seed.into_parts()?;

    let mut bus = TaskEventBus::named("board");
    let views = BoardViews::attach(&mut bus, views_config)?;
    let board = TaskBoard::new(repository, bus)
        .with_users(users)
        .with_aggregator(OverviewAggregator::new(overview_config));

    replay(&board).await?;

    let overdue = board
        .overdue_scan(config.overdue_days, today)
        .await
        .wrap_err("Overdue scan failed")?;
    if !overdue.is_empty() {
        warn!(count = overdue.len(), "Overdue tasks found");
    }

    let overview = match board.overview_until(TaskFilter::default(), shutdown).await {
        Ok(overview) => overview,
        Err(TaskError::Cancelled(_)) => return Ok(None),
        Err(e) => return Err(e).wrap_err("Project overview failed"),
    };

    Ok(Some(BoardReport {
        overview,
        in_progress: sorted_ids(views.in_progress.tasks().into_keys()),
        critical_bugs: sorted_ids(views.critical_bugs.bugs().into_keys()),
        overdue: overdue.into_iter().map(|task| task.id).collect(),
        recent_comments: views.comments.len(),
    }))
}

/// Announce every stored task so the views start from the seed state.
async fn replay(board: &TaskBoard<InMemoryTaskRepository>) -> Result<()> {
    let tasks = board
        .list_tasks(TaskFilter::default())
        .await
        .wrap_err("Failed to list seeded tasks")?;

    let mut failed = 0;
    for task in &tasks {
        let report = board.publish(TaskEvent::TaskCreated(TaskPayload::from(task)));
        failed += report.failures.len();
    }

    info!(tasks = tasks.len(), failed, "Seed replayed through views");
    Ok(())
}

fn sorted_ids(ids: impl Iterator<Item = TaskId>) -> Vec<TaskId> {
    let mut ids: Vec<_> = ids.collect();
    ids.sort();
    ids
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.wrap_err("Failed to install Ctrl+C handler")?;
                info!("Received Ctrl+C, cancelling overview...");
            },
            _ = terminate.recv() => {
                info!("Received SIGTERM, cancelling overview...");
            },
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .wrap_err("Failed to install Ctrl+C handler")?;
        info!("Received Ctrl+C, cancelling overview...");
    }

    Ok(())
}
