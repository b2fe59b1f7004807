use crate::collections::poller::{spawn_poller, CollectionSource};
use crate::collections::CollectionStore;
use crate::errors::{DashboardError, DashboardResult};
use crate::models::ViewResult;
use crate::projection::ProjectionOptions;
use crate::schedule::ScheduleSet;
use crate::settings::DashboardSettings;
use crate::stats::{StatisticsHistory, StatisticsSnapshot};
use crate::timer::{RefreshTimer, SnapshotExecutor, SnapshotFuture};
use crate::views::{assemble, catalog};
use chrono::{FixedOffset, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Dashboard {
    store: CollectionStore,
    settings: Arc<DashboardSettings>,
    schedules: Arc<ScheduleSet>,
    offset: FixedOffset,
    statistics: StatisticsHistory,
}

impl Dashboard {
    pub fn new(settings: DashboardSettings) -> DashboardResult<Self> {
        Self::with_store(settings, CollectionStore::new())
    }

    pub fn with_store(settings: DashboardSettings, store: CollectionStore) -> DashboardResult<Self> {
        let schedules = settings.validate()?;
        let offset = settings.utc_offset()?;
        let statistics =
            StatisticsHistory::with_limit(&settings.cloud_controller_uri, settings.stats_history_limit);
        tracing::info!(
            schedules = schedules.len(),
            label = %settings.cloud_controller_uri,
            "dashboard configured"
        );
        Ok(Self {
            store,
            settings: Arc::new(settings),
            schedules: Arc::new(schedules),
            offset,
            statistics,
        })
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn statistics(&self) -> &StatisticsHistory {
        &self.statistics
    }

    pub async fn get_view(&self, name: &str) -> DashboardResult<ViewResult> {
        let view = catalog::find(name).ok_or_else(|| DashboardError::UnknownView(name.to_string()))?;
        let collections = self.store.snapshot(view.required.iter().map(String::as_str));
        let options = ProjectionOptions::with_timeout(self.settings.projection_timeout());
        let result = assemble(view, &collections, &options).await?;
        tracing::debug!(
            view = name,
            connected = result.connected,
            rows = result.items.len(),
            "view assembled"
        );
        Ok(result)
    }

    pub fn current_statistics(&self) -> StatisticsSnapshot {
        let collections = self.store.snapshot(StatisticsSnapshot::SOURCES);
        StatisticsSnapshot::compute(&collections, Utc::now())
    }

    pub fn statistics_timer(&self) -> RefreshTimer {
        let store = self.store.clone();
        let statistics = self.statistics.clone();
        let executor: SnapshotExecutor = Arc::new(move || -> SnapshotFuture {
            let store = store.clone();
            let statistics = statistics.clone();
            Box::pin(async move {
                let collections = store.snapshot(StatisticsSnapshot::SOURCES);
                statistics.capture(&collections, Utc::now())?;
                Ok(())
            })
        });

        RefreshTimer::new(self.schedules.as_ref().clone(), executor)
            .with_offset(self.offset)
            .with_retry_delay(self.settings.retry_delay())
    }

    pub fn start_statistics_timer(&self) -> JoinHandle<()> {
        self.statistics_timer().start()
    }

    pub fn spawn_poller(
        &self,
        source: Arc<dyn CollectionSource>,
        interval: Duration,
    ) -> DashboardResult<JoinHandle<()>> {
        let name = source.name().to_string();
        let handle = spawn_poller(self.store.clone(), source, interval)?;
        tracing::info!(collection = %name, interval_ms = interval.as_millis() as u64, "poller started");
        Ok(handle)
    }
}
