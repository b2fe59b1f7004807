use crate::collections::{CollectionSet, APPLICATIONS, DEAS, ORGANIZATIONS, SPACES, USERS_UAA};
use crate::errors::{DashboardError, DashboardResult};
use crate::models::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

const STARTED: &str = "STARTED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub apps: Option<u64>,
    pub deas: Option<u64>,
    pub organizations: Option<u64>,
    pub running_instances: Option<u64>,
    pub spaces: Option<u64>,
    pub timestamp: i64,
    pub total_instances: Option<u64>,
    pub users: Option<u64>,
}

impl StatisticsSnapshot {
    pub const SOURCES: [&'static str; 5] = [APPLICATIONS, DEAS, ORGANIZATIONS, SPACES, USERS_UAA];

    pub fn compute(collections: &CollectionSet, at: DateTime<Utc>) -> Self {
        let count = |name: &str| {
            collections
                .get(name)
                .filter(|collection| collection.connected)
                .map(|collection| collection.len() as u64)
        };
        let instances = |filter: fn(&Record) -> bool| {
            collections
                .get(APPLICATIONS)
                .filter(|collection| collection.connected)
                .map(|collection| {
                    collection
                        .items
                        .iter()
                        .filter(|app| filter(app))
                        .filter_map(|app| app.get("instances").and_then(|v| v.as_u64()))
                        .sum::<u64>()
                })
        };

        Self {
            apps: count(APPLICATIONS),
            deas: count(DEAS),
            organizations: count(ORGANIZATIONS),
            running_instances: instances(|app| app.get_str("state") == Some(STARTED)),
            spaces: count(SPACES),
            timestamp: at.timestamp_millis(),
            total_instances: instances(|_| true),
            users: count(USERS_UAA),
        }
    }

    pub fn has_data(&self) -> bool {
        [
            self.apps,
            self.deas,
            self.organizations,
            self.running_instances,
            self.spaces,
            self.total_instances,
            self.users,
        ]
        .iter()
        .any(Option::is_some)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsReport {
    pub label: String,
    pub items: Vec<StatisticsSnapshot>,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct StatisticsHistory {
    label: String,
    limit: usize,
    items: Arc<RwLock<Vec<StatisticsSnapshot>>>,
}

impl StatisticsHistory {
    pub fn new(label: &str) -> Self {
        Self::with_limit(label, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(label: &str, limit: usize) -> Self {
        Self {
            label: label.to_string(),
            limit: limit.max(1),
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Inserts in timestamp order; a snapshot with an existing timestamp
    /// replaces the earlier one.
    pub fn record(&self, snapshot: StatisticsSnapshot) {
        let mut items = self
            .items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match items.binary_search_by_key(&snapshot.timestamp, |item| item.timestamp) {
            Ok(position) => items[position] = snapshot,
            Err(position) => items.insert(position, snapshot),
        }
        if items.len() > self.limit {
            let excess = items.len() - self.limit;
            items.drain(..excess);
        }
    }

    /// Computes and records a snapshot. Fails when every source is
    /// disconnected.
    pub fn capture(&self, collections: &CollectionSet, at: DateTime<Utc>) -> DashboardResult<StatisticsSnapshot> {
        let snapshot = StatisticsSnapshot::compute(collections, at);
        if !snapshot.has_data() {
            return Err(DashboardError::Internal(
                "no statistics source is connected".to_string(),
            ));
        }
        self.record(snapshot.clone());
        tracing::info!(
            timestamp = snapshot.timestamp,
            apps = ?snapshot.apps,
            organizations = ?snapshot.organizations,
            "statistics snapshot recorded"
        );
        Ok(snapshot)
    }

    pub fn latest(&self) -> Option<StatisticsSnapshot> {
        self.items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }

    pub fn report(&self) -> StatisticsReport {
        StatisticsReport {
            label: self.label.clone(),
            items: self
                .items
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StatisticsHistory, StatisticsSnapshot};
    use crate::collections::{CollectionSet, APPLICATIONS, DEAS, ORGANIZATIONS, SPACES, USERS_UAA};
    use crate::models::{Collection, Record};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn snapshot(timestamp: i64, apps: u64) -> StatisticsSnapshot {
        StatisticsSnapshot {
            apps: Some(apps),
            deas: None,
            organizations: None,
            running_instances: None,
            spaces: None,
            timestamp,
            total_instances: None,
            users: None,
        }
    }

    fn platform() -> CollectionSet {
        CollectionSet::new()
            .with(
                APPLICATIONS,
                Collection::connected(vec![
                    Record::new().with("state", "STARTED").with("instances", 3),
                    Record::new().with("state", "STOPPED").with("instances", 2),
                    Record::new().with("state", "STARTED"),
                ]),
            )
            .with(DEAS, Collection::connected(vec![Record::new(), Record::new()]))
            .with(ORGANIZATIONS, Collection::connected(vec![Record::new().with("id", 1)]))
            .with(SPACES, Collection::disconnected())
            .with(USERS_UAA, Collection::connected(Vec::new()))
    }

    #[test]
    fn counts_connected_sources_and_sums_instances() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().expect("timestamp");
        let stats = StatisticsSnapshot::compute(&platform(), at);
        assert_eq!(stats.apps, Some(3));
        assert_eq!(stats.deas, Some(2));
        assert_eq!(stats.organizations, Some(1));
        assert_eq!(stats.spaces, None);
        assert_eq!(stats.users, Some(0));
        assert_eq!(stats.total_instances, Some(5));
        assert_eq!(stats.running_instances, Some(3));
        assert_eq!(stats.timestamp, at.timestamp_millis());
    }

    #[test]
    fn disconnected_sources_serialize_as_null() {
        let stats = StatisticsSnapshot::compute(&CollectionSet::new(), Utc::now());
        let value = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(value["apps"], json!(null));
        assert_eq!(value["users"], json!(null));
        assert!(!stats.has_data());
    }

    #[test]
    fn capture_refuses_snapshot_without_any_source() {
        let history = StatisticsHistory::new("http://api.localhost");
        assert!(history.capture(&CollectionSet::new(), Utc::now()).is_err());
        assert!(history.latest().is_none());

        let recorded = history.capture(&platform(), Utc::now()).expect("capture");
        assert_eq!(history.latest(), Some(recorded));
    }

    #[test]
    fn history_is_ordered_and_replaces_same_timestamp() {
        let history = StatisticsHistory::new("http://api.localhost");
        history.record(snapshot(20, 2));
        history.record(snapshot(10, 1));
        history.record(snapshot(20, 5));

        let report = history.report();
        assert_eq!(report.label, "http://api.localhost");
        let stamps = report.items.iter().map(|item| (item.timestamp, item.apps)).collect::<Vec<_>>();
        assert_eq!(stamps, vec![(10, Some(1)), (20, Some(5))]);
    }

    #[test]
    fn history_drops_oldest_beyond_limit() {
        let history = StatisticsHistory::with_limit("http://api.localhost", 3);
        for timestamp in [50, 10, 40, 20, 30] {
            history.record(snapshot(timestamp, 1));
        }
        let stamps = history.report().items.iter().map(|item| item.timestamp).collect::<Vec<_>>();
        assert_eq!(stamps, vec![30, 40, 50]);

        history.record(snapshot(5, 1));
        assert_eq!(history.report().items.first().map(|item| item.timestamp), Some(30));
    }

    #[test]
    fn report_serializes_label_and_items() {
        let history = StatisticsHistory::new("http://api.localhost");
        history.record(StatisticsSnapshot {
            apps: Some(1),
            deas: Some(2),
            organizations: Some(3),
            running_instances: Some(4),
            spaces: Some(5),
            timestamp: 6,
            total_instances: Some(7),
            users: Some(8),
        });
        assert_eq!(
            serde_json::to_value(history.report()).expect("serialize"),
            json!({
                "label": "http://api.localhost",
                "items": [{
                    "apps": 1, "deas": 2, "organizations": 3, "running_instances": 4,
                    "spaces": 5, "timestamp": 6, "total_instances": 7, "users": 8
                }]
            })
        );
    }
}
