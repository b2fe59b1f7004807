pub mod collections;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod projection;
pub mod schedule;
pub mod settings;
pub mod stats;
pub mod timer;
pub mod views;

pub use crate::collections::poller::{CollectionSource, FetchFuture, FnSource};
pub use crate::collections::{CollectionSet, CollectionStore};
pub use crate::dashboard::Dashboard;
pub use crate::errors::{DashboardError, DashboardResult};
pub use crate::models::{Collection, Record, ViewResult, ViewRow};
pub use crate::schedule::{Schedule, ScheduleSet};
pub use crate::settings::DashboardSettings;
pub use crate::stats::{StatisticsHistory, StatisticsReport, StatisticsSnapshot};
pub use crate::timer::{seconds_until_next_run, RefreshTimer};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Installs JSON logging to a daily rolling file under `log_dir`. `RUST_LOG`
/// overrides `default_level`. Calling it again after a subscriber is
/// installed is a no-op.
pub fn init_tracing(log_dir: &Path, default_level: &str) -> DashboardResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init();
    Ok(())
}

pub fn bootstrap(settings_path: &Path, log_dir: &Path) -> DashboardResult<Dashboard> {
    let settings = DashboardSettings::load(settings_path)?;
    settings.validate()?;
    init_tracing(log_dir, &settings.log_level)?;
    Dashboard::new(settings)
}
