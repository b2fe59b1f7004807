pub mod catalog;

use crate::collections::CollectionSet;
use crate::errors::{DashboardError, DashboardResult};
use crate::models::ViewResult;
use crate::projection::{project_with, JoinIndexes, JoinSpec, ProjectionOptions};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct ViewDefinition {
    pub name: String,
    /// Fixed connectivity precondition. Any of these being disconnected blanks
    /// the view, whether or not a join reads from it.
    pub required: Vec<String>,
    pub joins: Vec<JoinSpec>,
    pub sortable_columns: BTreeSet<usize>,
    pub searchable_columns: BTreeSet<usize>,
}

impl ViewDefinition {
    pub fn new(name: &str, required: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            required: required.iter().map(ToString::to_string).collect(),
            joins: Vec::new(),
            sortable_columns: BTreeSet::new(),
            searchable_columns: BTreeSet::new(),
        }
    }

    pub fn join(mut self, spec: JoinSpec) -> Self {
        self.joins.push(spec);
        self
    }

    pub fn sortable(mut self, columns: impl IntoIterator<Item = usize>) -> Self {
        self.sortable_columns.extend(columns);
        self
    }

    pub fn searchable(mut self, columns: impl IntoIterator<Item = usize>) -> Self {
        self.searchable_columns.extend(columns);
        self
    }

    pub fn width(&self) -> usize {
        self.joins.first().map(|join| join.columns.len()).unwrap_or(0)
    }

    pub fn validate(&self) -> DashboardResult<()> {
        let width = self.width();
        for join in &self.joins {
            join.validate()?;
            if join.columns.len() != width {
                return Err(DashboardError::Internal(format!(
                    "view '{}': join '{}' has {} columns, expected {}",
                    self.name,
                    join.label,
                    join.columns.len(),
                    width
                )));
            }
            if let Some(name) = join.collections().find(|name| !self.required.iter().any(|required| required.as_str() == *name)) {
                return Err(DashboardError::Internal(format!(
                    "view '{}': join '{}' reads '{}' outside the required set",
                    self.name, join.label, name
                )));
            }
        }
        let out_of_range = self
            .sortable_columns
            .iter()
            .chain(self.searchable_columns.iter())
            .find(|column| **column >= width);
        if let Some(column) = out_of_range {
            return Err(DashboardError::Internal(format!(
                "view '{}': column index {} out of range for {} columns",
                self.name, column, width
            )));
        }
        Ok(())
    }

    fn result(&self, connected: bool) -> ViewResult {
        ViewResult {
            connected,
            items: Vec::new(),
            sortable_columns: self.sortable_columns.clone(),
            searchable_columns: self.searchable_columns.clone(),
        }
    }
}

pub async fn assemble(
    view: &ViewDefinition,
    collections: &CollectionSet,
    options: &ProjectionOptions,
) -> DashboardResult<ViewResult> {
    let offline = view
        .required
        .iter()
        .filter(|name| !collections.is_connected(name))
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !offline.is_empty() {
        tracing::debug!(view = %view.name, offline = ?offline, "view unavailable, sources disconnected");
        return Ok(view.result(false));
    }

    let mut result = view.result(true);
    let mut indexes = JoinIndexes::new(collections);
    let mut skipped = 0usize;
    for join in &view.joins {
        let outcome = project_with(join, &mut indexes, options).await?;
        skipped += outcome.skipped;
        result.items.extend(outcome.rows);
        if outcome.truncated {
            tracing::debug!(view = %view.name, join = %join.label, "view truncated at deadline");
            break;
        }
    }

    tracing::trace!(view = %view.name, rows = result.items.len(), skipped, "view assembled");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{assemble, ViewDefinition};
    use crate::collections::CollectionSet;
    use crate::models::{Collection, Record};
    use crate::projection::{Column, JoinSpec, Lookup, ProjectionOptions};
    use serde_json::json;

    fn spaces_view() -> ViewDefinition {
        ViewDefinition::new("spaces", &["spaces", "organizations", "quota_definitions"])
            .join(
                JoinSpec::new("spaces", "spaces", "space")
                    .lookup(Lookup::new("organization", "organizations", "space", "organization_id"))
                    .column(Column::field("space", "name"))
                    .column(Column::field("organization", "name")),
            )
            .sortable([0, 1])
            .searchable([0])
    }

    fn connected_set() -> CollectionSet {
        CollectionSet::new()
            .with(
                "organizations",
                Collection::connected(vec![Record::new().with("id", 1).with("name", "Org A")]),
            )
            .with(
                "spaces",
                Collection::connected(vec![Record::new().with("name", "dev").with("organization_id", 1)]),
            )
            .with("quota_definitions", Collection::connected(Vec::new()))
    }

    #[tokio::test]
    async fn assembles_rows_with_column_metadata() {
        let result = assemble(&spaces_view(), &connected_set(), &ProjectionOptions::default())
            .await
            .expect("assemble");
        assert!(result.connected);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].values, vec![json!("dev"), json!("Org A")]);
        assert_eq!(result.sortable_columns.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(result.searchable_columns.iter().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[tokio::test]
    async fn declared_auxiliary_collection_gates_the_view() {
        let set = connected_set().with("quota_definitions", Collection::disconnected());
        let result = assemble(&spaces_view(), &set, &ProjectionOptions::default())
            .await
            .expect("assemble");
        assert!(!result.connected);
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn absent_collection_counts_as_disconnected() {
        let set = CollectionSet::new().with("spaces", Collection::connected(Vec::new()));
        let result = assemble(&spaces_view(), &set, &ProjectionOptions::default())
            .await
            .expect("assemble");
        assert_eq!(
            serde_json::to_value(&result).expect("serialize"),
            json!({"connected": false, "items": []})
        );
    }

    #[tokio::test]
    async fn joins_concatenate_in_declared_order() {
        let role = |label: &str, table: &str| {
            JoinSpec::new(label, table, "role")
                .lookup(Lookup::new("user", "users", "role", "user_id"))
                .column(Column::field("user", "name"))
                .column(Column::Label)
        };
        let view = ViewDefinition::new("roles", &["auditors", "managers", "users"])
            .join(role("Auditor", "auditors"))
            .join(role("Manager", "managers"));
        let user = |id: i64| Record::new().with("user_id", id);
        let set = CollectionSet::new()
            .with(
                "users",
                Collection::connected(vec![
                    Record::new().with("id", 1).with("name", "ann"),
                    Record::new().with("id", 2).with("name", "bob"),
                    Record::new().with("id", 3).with("name", "cy"),
                ]),
            )
            .with("auditors", Collection::connected(vec![user(3), user(1)]))
            .with("managers", Collection::connected(vec![user(2), user(3)]));

        let result = assemble(&view, &set, &ProjectionOptions::default())
            .await
            .expect("assemble");
        let rows = result.items.iter().map(|row| row.values.clone()).collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                vec![json!("cy"), json!("Auditor")],
                vec![json!("ann"), json!("Auditor")],
                vec![json!("bob"), json!("Manager")],
                vec![json!("cy"), json!("Manager")],
            ]
        );
    }

    #[test]
    fn validate_catches_mismatched_widths_and_columns() {
        let view = spaces_view().join(
            JoinSpec::new("narrow", "spaces", "space").column(Column::field("space", "name")),
        );
        assert!(view.validate().is_err());

        let view = spaces_view().sortable([5]);
        assert!(view.validate().is_err());

        let view = ViewDefinition::new("spaces", &["spaces"]).join(
            JoinSpec::new("spaces", "spaces", "space")
                .lookup(Lookup::new("organization", "organizations", "space", "organization_id"))
                .column(Column::field("space", "name")),
        );
        assert!(view.validate().is_err());

        assert!(spaces_view().validate().is_ok());
    }
}
