use crate::errors::{DashboardError, DashboardResult};
use crate::schedule::ScheduleSet;
use crate::stats::DEFAULT_HISTORY_LIMIT;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub cloud_controller_uri: String,
    pub stats_refresh_schedules: Vec<String>,
    pub stats_retry_seconds: u64,
    pub stats_history_limit: usize,
    pub projection_timeout_ms: u64,
    pub schedule_utc_offset_minutes: i32,
    pub log_level: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            cloud_controller_uri: "http://api.localhost".to_string(),
            stats_refresh_schedules: vec!["0 5 * * *".to_string()],
            stats_retry_seconds: 300,
            stats_history_limit: DEFAULT_HISTORY_LIMIT,
            projection_timeout_ms: 30_000,
            schedule_utc_offset_minutes: 0,
            log_level: "info".to_string(),
        }
    }
}

impl DashboardSettings {
    /// Reads a `.json` file as JSON and anything else as YAML. Missing keys
    /// fall back to their defaults.
    pub fn load(path: &Path) -> DashboardResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let settings = if is_json {
            serde_json::from_str(&raw)?
        } else {
            Self::from_yaml_str(&raw)?
        };
        tracing::debug!(path = %path.display(), "dashboard settings loaded");
        Ok(settings)
    }

    pub fn from_yaml_str(raw: &str) -> DashboardResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> DashboardResult<ScheduleSet> {
        let schedules = ScheduleSet::parse(&self.stats_refresh_schedules)?;
        self.utc_offset()?;
        if self.stats_history_limit == 0 {
            return Err(DashboardError::Settings(
                "stats_history_limit must be greater than zero".to_string(),
            ));
        }
        if self.projection_timeout_ms == 0 {
            return Err(DashboardError::Settings(
                "projection_timeout_ms must be greater than zero".to_string(),
            ));
        }
        tracing_subscriber::EnvFilter::try_new(&self.log_level).map_err(|error| {
            DashboardError::Settings(format!("log_level '{}': {}", self.log_level, error))
        })?;
        Ok(schedules)
    }

    pub fn utc_offset(&self) -> DashboardResult<FixedOffset> {
        self.schedule_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                DashboardError::Settings(format!(
                    "schedule_utc_offset_minutes {} is outside +/-24h",
                    self.schedule_utc_offset_minutes
                ))
            })
    }

    pub fn projection_timeout(&self) -> Duration {
        Duration::from_millis(self.projection_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.stats_retry_seconds)
    }
}
