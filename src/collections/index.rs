use crate::models::{Collection, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_KEY_FIELD: &str = "id";

/// Identifier a record can be looked up by. Integer and string identifiers
/// never compare equal to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Int(i64),
    Str(String),
}

impl RecordKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Int),
            Value::String(text) => Some(Self::Str(text.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

#[derive(Debug, Default)]
pub struct CollectionIndex {
    by_key: HashMap<RecordKey, Arc<Record>>,
}

impl CollectionIndex {
    pub fn build(collection: &Collection) -> Self {
        Self::build_by(collection, DEFAULT_KEY_FIELD)
    }

    pub fn build_by(collection: &Collection, key_field: &str) -> Self {
        let mut by_key = HashMap::with_capacity(collection.items.len());
        let mut skipped = 0usize;
        for record in &collection.items {
            match record.get(key_field).and_then(RecordKey::from_value) {
                Some(key) => {
                    by_key.insert(key, Arc::clone(record));
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(key_field, skipped, "records without an indexable identifier");
        }
        Self { by_key }
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Arc<Record>> {
        self.by_key.get(key)
    }

    pub fn lookup(&self, value: &Value) -> Option<&Arc<Record>> {
        RecordKey::from_value(value).and_then(|key| self.by_key.get(&key))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionIndex, RecordKey};
    use crate::models::{Collection, Record};
    use serde_json::json;

    #[test]
    fn indexes_integer_and_string_identifiers() {
        let users_cc = Collection::connected(vec![
            Record::new().with("id", 10).with("guid", "user-x"),
            Record::new().with("id", 11).with("guid", "user-y"),
        ]);
        let index = CollectionIndex::build(&users_cc);
        assert_eq!(index.len(), 2);
        let found = index.get(&RecordKey::from(11)).expect("user 11");
        assert_eq!(found.get_str("guid"), Some("user-y"));

        let by_guid = CollectionIndex::build_by(&users_cc, "guid");
        assert!(by_guid.lookup(&json!("user-x")).is_some());
    }

    #[test]
    fn duplicate_identifiers_keep_the_last_record() {
        let orgs = Collection::connected(vec![
            Record::new().with("id", 1).with("name", "old"),
            Record::new().with("id", 1).with("name", "new"),
        ]);
        let index = CollectionIndex::build(&orgs);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(&json!(1)).and_then(|r| r.get_str("name")), Some("new"));
    }

    #[test]
    fn integer_and_string_keys_do_not_match() {
        let orgs = Collection::connected(vec![Record::new().with("id", 1)]);
        let index = CollectionIndex::build(&orgs);
        assert!(index.lookup(&json!("1")).is_none());
        assert!(index.lookup(&json!(null)).is_none());
    }

    #[test]
    fn records_without_identifier_are_skipped() {
        let orgs = Collection::connected(vec![
            Record::new().with("name", "nameless"),
            Record::new().with("id", json!({"nested": true})),
            Record::new().with("id", 3),
        ]);
        assert_eq!(CollectionIndex::build(&orgs).len(), 1);
    }
}
