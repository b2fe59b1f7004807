pub mod index;
pub mod poller;

use crate::models::Collection;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub use index::{CollectionIndex, RecordKey};

pub const APPLICATIONS: &str = "applications";
pub const DEAS: &str = "deas";
pub const DOMAINS: &str = "domains";
pub const ORGANIZATIONS: &str = "organizations";
pub const ORGANIZATIONS_AUDITORS: &str = "organizations_auditors";
pub const ORGANIZATIONS_BILLING_MANAGERS: &str = "organizations_billing_managers";
pub const ORGANIZATIONS_MANAGERS: &str = "organizations_managers";
pub const ORGANIZATIONS_USERS: &str = "organizations_users";
pub const ROUTES: &str = "routes";
pub const SPACES: &str = "spaces";
pub const SPACES_AUDITORS: &str = "spaces_auditors";
pub const SPACES_DEVELOPERS: &str = "spaces_developers";
pub const SPACES_MANAGERS: &str = "spaces_managers";
pub const USERS_CC: &str = "users_cc";
pub const USERS_UAA: &str = "users_uaa";

#[derive(Debug, Clone, Default)]
pub struct CollectionSet {
    collections: HashMap<String, Arc<Collection>>,
}

impl CollectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, collection: Collection) -> Self {
        self.insert(name, collection);
        self
    }

    pub fn insert(&mut self, name: &str, collection: Collection) {
        self.collections.insert(name.to_string(), Arc::new(collection));
    }

    pub fn insert_shared(&mut self, name: &str, collection: Arc<Collection>) {
        self.collections.insert(name.to_string(), collection);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Collection>> {
        self.collections.get(name)
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.collections
            .get(name)
            .map(|collection| collection.connected)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionStore {
    collections: Arc<RwLock<HashMap<String, Arc<Collection>>>>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, name: &str, collection: Collection) {
        let connected = collection.connected;
        let items = collection.len();
        let collection = Arc::new(collection);
        let mut writer = self
            .collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.insert(name.to_string(), collection);
        drop(writer);
        tracing::trace!(collection = name, connected, items, "collection published");
    }

    pub fn get(&self, name: &str) -> Arc<Collection> {
        let reader = self
            .collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reader
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(Collection::disconnected()))
    }

    /// Captures the named collections under one read lock, so a pass never
    /// mixes snapshots taken before and after a publish of the same name.
    pub fn snapshot<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> CollectionSet {
        let reader = self
            .collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut set = CollectionSet::new();
        for name in names {
            if let Some(collection) = reader.get(name) {
                set.insert_shared(name, Arc::clone(collection));
            }
        }
        set
    }
}
