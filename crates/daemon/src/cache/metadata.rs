//! In-memory metadata cache keyed by `(repository, reference, path)`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::RemotePath;

use crate::dav::ObjectInfo;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaKey {
    pub repository: String,
    pub reference: String,
    pub path: String,
}

impl MetaKey {
    pub fn from_location(location: &RemotePath) -> Self {
        Self {
            repository: location.repository.clone(),
            reference: location.reference.clone(),
            path: location.path.clone(),
        }
    }
}

/// Outcome of a previous stat probe. A cached `Missing` is as valuable as a
/// hit: the adapter constantly probes paths that do not exist while telling
/// files apart from directories. A `get_object` returning `None` means the
/// path has not been probed at all.
#[derive(Debug, Clone)]
pub enum ObjectEntry {
    Present(ObjectInfo),
    Missing,
}

/// Concurrency-safe stat and listing cache. Entries are never mutated after
/// insertion; an update is a whole-value replacement, so readers always see
/// a consistent snapshot.
#[derive(Debug, Default)]
pub struct MetadataCache {
    objects: RwLock<HashMap<MetaKey, ObjectEntry>>,
    listings: RwLock<HashMap<MetaKey, Arc<Vec<ObjectInfo>>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_object(&self, key: &MetaKey) -> Option<ObjectEntry> {
        self.objects.read().unwrap().get(key).cloned()
    }

    pub fn set_object(&self, key: MetaKey, entry: ObjectEntry) {
        self.objects.write().unwrap().insert(key, entry);
    }

    /// Only full (unbounded, all pages drained) listings are ever stored
    /// here; bounded listings are indistinguishable from partial results.
    pub fn get_listing(&self, key: &MetaKey) -> Option<Arc<Vec<ObjectInfo>>> {
        self.listings.read().unwrap().get(key).cloned()
    }

    pub fn set_listing(&self, key: MetaKey, listing: Arc<Vec<ObjectInfo>>) {
        self.listings.write().unwrap().insert(key, listing);
    }
}
