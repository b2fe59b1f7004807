use crate::errors::DashboardResult;
use crate::schedule::ScheduleSet;
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub type SnapshotFuture = Pin<Box<dyn Future<Output = DashboardResult<()>> + Send>>;
pub type SnapshotExecutor = Arc<dyn Fn() -> SnapshotFuture + Send + Sync>;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Whole seconds from `now` until the earliest schedule fires after
/// `last_run`, floored at zero. `None` only when no schedule fires again.
pub fn seconds_until_next_run<Tz: TimeZone>(
    schedules: &ScheduleSet,
    last_run: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> Option<u64> {
    let next = schedules.next_occurrence(last_run)?;
    Some((next.timestamp() - now.timestamp()).max(0) as u64)
}

pub struct RefreshTimer {
    schedules: ScheduleSet,
    offset: FixedOffset,
    retry_delay: Duration,
    last_run: DateTime<Utc>,
    last_run_tx: watch::Sender<DateTime<Utc>>,
    executor: SnapshotExecutor,
}

impl RefreshTimer {
    pub fn new(schedules: ScheduleSet, executor: SnapshotExecutor) -> Self {
        let last_run = Utc::now();
        let (last_run_tx, _) = watch::channel(last_run);
        Self {
            schedules,
            offset: Utc.fix(),
            retry_delay: DEFAULT_RETRY_DELAY,
            last_run,
            last_run_tx,
            executor,
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_last_run(mut self, last_run: DateTime<Utc>) -> Self {
        self.last_run = last_run;
        self.last_run_tx.send_replace(last_run);
        self
    }

    pub fn last_run(&self) -> DateTime<Utc> {
        self.last_run
    }

    pub fn subscribe(&self) -> watch::Receiver<DateTime<Utc>> {
        self.last_run_tx.subscribe()
    }

    pub fn seconds_until_next_run(&self, now: DateTime<Utc>) -> Option<u64> {
        seconds_until_next_run(
            &self.schedules,
            &self.last_run.with_timezone(&self.offset),
            &now.with_timezone(&self.offset),
        )
    }

    /// Runs one snapshot. `last_run` moves to the completion time only when
    /// the snapshot succeeds.
    pub async fn run_once(&mut self) -> DashboardResult<()> {
        (self.executor)().await?;
        self.last_run = Utc::now();
        self.last_run_tx.send_replace(self.last_run);
        Ok(())
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run_loop())
    }

    async fn run_loop(mut self) {
        loop {
            let Some(wait) = self.seconds_until_next_run(Utc::now()) else {
                tracing::error!(last_run = %self.last_run, "no statistics schedule fires again, timer stopped");
                return;
            };
            tracing::debug!(wait_seconds = wait, last_run = %self.last_run, "next statistics snapshot scheduled");
            tokio::time::sleep(Duration::from_secs(wait)).await;

            if let Err(error) = self.run_once().await {
                tracing::warn!(
                    error = %error,
                    retry_seconds = self.retry_delay.as_secs(),
                    "statistics snapshot failed"
                );
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }
}
