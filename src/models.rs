use crate::errors::{DashboardError, DashboardResult};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> DashboardResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(DashboardError::Internal(format!(
                "record must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    pub connected: bool,
    pub items: Vec<Arc<Record>>,
}

impl Collection {
    pub fn connected(items: Vec<Record>) -> Self {
        Self {
            connected: true,
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub values: Vec<Value>,
    pub metadata: BTreeMap<String, Arc<Record>>,
}

// Wire shape: `[v0, ..., vN-1, {"<role>": record, ...}]`.
impl Serialize for ViewRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.values.len() + 1))?;
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.serialize_element(&self.metadata)?;
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResult {
    pub connected: bool,
    pub items: Vec<ViewRow>,
    #[serde(skip)]
    pub sortable_columns: BTreeSet<usize>,
    #[serde(skip)]
    pub searchable_columns: BTreeSet<usize>,
}

impl ViewResult {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            items: Vec::new(),
            sortable_columns: BTreeSet::new(),
            searchable_columns: BTreeSet::new(),
        }
    }
}
