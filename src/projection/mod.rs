use crate::collections::index::{CollectionIndex, DEFAULT_KEY_FIELD};
use crate::collections::CollectionSet;
use crate::errors::{DashboardError, DashboardResult};
use crate::models::{Record, ViewRow};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub role: String,
    pub collection: String,
    pub from_role: String,
    pub from_field: String,
    pub target_field: String,
}

impl Lookup {
    pub fn new(role: &str, collection: &str, from_role: &str, from_field: &str) -> Self {
        Self {
            role: role.to_string(),
            collection: collection.to_string(),
            from_role: from_role.to_string(),
            from_field: from_field.to_string(),
            target_field: DEFAULT_KEY_FIELD.to_string(),
        }
    }

    pub fn matching(mut self, target_field: &str) -> Self {
        self.target_field = target_field.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Field { role: String, field: String },
    Label,
}

impl Column {
    pub fn field(role: &str, field: &str) -> Self {
        Self::Field {
            role: role.to_string(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub label: String,
    pub primary: String,
    pub primary_role: String,
    pub lookups: Vec<Lookup>,
    pub columns: Vec<Column>,
}

impl JoinSpec {
    pub fn new(label: &str, primary: &str, primary_role: &str) -> Self {
        Self {
            label: label.to_string(),
            primary: primary.to_string(),
            primary_role: primary_role.to_string(),
            lookups: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.lookups.iter().map(|l| l.collection.as_str()))
    }

    pub fn validate(&self) -> DashboardResult<()> {
        let mut roles = vec![self.primary_role.as_str()];
        for lookup in &self.lookups {
            if !roles.contains(&lookup.from_role.as_str()) {
                return Err(DashboardError::Internal(format!(
                    "join '{}': lookup '{}' reads from unknown role '{}'",
                    self.label, lookup.role, lookup.from_role
                )));
            }
            if roles.contains(&lookup.role.as_str()) {
                return Err(DashboardError::Internal(format!(
                    "join '{}': role '{}' attached twice",
                    self.label, lookup.role
                )));
            }
            roles.push(lookup.role.as_str());
        }
        for column in &self.columns {
            if let Column::Field { role, field } = column {
                if !roles.contains(&role.as_str()) {
                    return Err(DashboardError::Internal(format!(
                        "join '{}': column '{}' reads from unknown role '{}'",
                        self.label, field, role
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionOptions {
    pub deadline: Option<Instant>,
    pub allow_partial: bool,
}

impl ProjectionOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            allow_partial: false,
        }
    }

    fn expired(&self) -> bool {
        self.deadline.map(|deadline| Instant::now() >= deadline).unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct ProjectionOutcome {
    pub rows: Vec<ViewRow>,
    pub skipped: usize,
    pub truncated: bool,
}

pub struct JoinIndexes<'a> {
    collections: &'a CollectionSet,
    // collection -> target field -> index
    built: HashMap<String, HashMap<String, CollectionIndex>>,
}

impl<'a> JoinIndexes<'a> {
    pub fn new(collections: &'a CollectionSet) -> Self {
        Self {
            collections,
            built: HashMap::new(),
        }
    }

    fn prepare(&mut self, spec: &JoinSpec) {
        for lookup in &spec.lookups {
            if self.get(&lookup.collection, &lookup.target_field).is_some() {
                continue;
            }
            if let Some(collection) = self.collections.get(&lookup.collection) {
                let index = CollectionIndex::build_by(collection, &lookup.target_field);
                self.built
                    .entry(lookup.collection.clone())
                    .or_default()
                    .insert(lookup.target_field.clone(), index);
            }
        }
    }

    fn get(&self, collection: &str, target_field: &str) -> Option<&CollectionIndex> {
        self.built.get(collection)?.get(target_field)
    }
}

pub async fn project(
    spec: &JoinSpec,
    collections: &CollectionSet,
    options: &ProjectionOptions,
) -> DashboardResult<Vec<ViewRow>> {
    let mut indexes = JoinIndexes::new(collections);
    project_with(spec, &mut indexes, options).await.map(|outcome| outcome.rows)
}

pub async fn project_with(
    spec: &JoinSpec,
    indexes: &mut JoinIndexes<'_>,
    options: &ProjectionOptions,
) -> DashboardResult<ProjectionOutcome> {
    indexes.prepare(spec);
    let collections = indexes.collections;
    let mut outcome = ProjectionOutcome::default();
    let Some(primary) = collections.get(&spec.primary) else {
        return Ok(outcome);
    };

    for record in &primary.items {
        tokio::task::yield_now().await;
        if options.expired() {
            if options.allow_partial {
                outcome.truncated = true;
                break;
            }
            return Err(DashboardError::Cancelled(format!(
                "projection '{}' passed its deadline after {} rows",
                spec.label,
                outcome.rows.len()
            )));
        }
        match resolve_row(spec, record, indexes) {
            Some(row) => outcome.rows.push(row),
            None => outcome.skipped += 1,
        }
    }

    if outcome.skipped > 0 {
        tracing::trace!(
            join = %spec.label,
            primary = %spec.primary,
            skipped = outcome.skipped,
            "dropped rows with unresolved references"
        );
    }
    Ok(outcome)
}

fn resolve_row(spec: &JoinSpec, primary: &Arc<Record>, indexes: &JoinIndexes<'_>) -> Option<ViewRow> {
    let mut metadata = BTreeMap::new();
    metadata.insert(spec.primary_role.clone(), Arc::clone(primary));

    for lookup in &spec.lookups {
        let source = Arc::clone(metadata.get(&lookup.from_role)?);
        let key = source.get(&lookup.from_field)?;
        let target = indexes
            .get(&lookup.collection, &lookup.target_field)?
            .lookup(key)?;
        metadata.insert(lookup.role.clone(), Arc::clone(target));
    }

    let values = spec
        .columns
        .iter()
        .map(|column| match column {
            Column::Label => Value::String(spec.label.clone()),
            Column::Field { role, field } => metadata
                .get(role)
                .and_then(|record| record.get(field))
                .cloned()
                .unwrap_or(Value::Null),
        })
        .collect();

    Some(ViewRow { values, metadata })
}
