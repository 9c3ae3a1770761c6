//! Registry of active mounts, the daemon's only mutable shared state.

use std::collections::BTreeMap;
use std::sync::RwLock;

use common::{MountMode, RemotePath};
use serde::{Deserialize, Serialize};

/// One active mount as exchanged over the control API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountInfo {
    pub remote: RemotePath,
    /// Absolute, canonicalized local mount point.
    pub local_path: String,
    pub mode: MountMode,
}

/// Mounts keyed by local path. The key order of the map gives listings
/// their ascending-by-`local_path` ordering; registering an existing path
/// overwrites.
#[derive(Debug, Default)]
pub struct MountRegistry {
    mounts: RwLock<BTreeMap<String, MountInfo>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, info: MountInfo) {
        self.mounts
            .write()
            .unwrap()
            .insert(info.local_path.clone(), info);
    }

    /// Returns whether an entry was actually removed.
    pub fn unregister(&self, local_path: &str) -> bool {
        self.mounts.write().unwrap().remove(local_path).is_some()
    }

    pub fn list(&self) -> Vec<MountInfo> {
        self.mounts.read().unwrap().values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(local: &str, path: &str) -> MountInfo {
        MountInfo {
            remote: RemotePath::new("repo", "main", path),
            local_path: local.to_string(),
            mode: MountMode::ReadOnly,
        }
    }

    #[test]
    fn list_is_sorted_by_local_path() {
        let registry = MountRegistry::new();
        registry.register(info("/mnt/b", "b"));
        registry.register(info("/mnt/a", "a"));
        registry.register(info("/mnt/c", "c"));

        let mounts = registry.list();
        let paths: Vec<&str> = mounts.iter().map(|m| m.local_path.as_str()).collect();
        assert_eq!(paths, vec!["/mnt/a", "/mnt/b", "/mnt/c"]);
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let registry = MountRegistry::new();
        registry.register(info("/mnt/a", "first"));
        registry.register(info("/mnt/a", "second"));

        let mounts = registry.list();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].remote.path, "second");
    }

    #[test]
    fn unregister_absent_is_harmless() {
        let registry = MountRegistry::new();
        assert!(!registry.unregister("/mnt/never"));
        registry.register(info("/mnt/a", "a"));
        assert!(registry.unregister("/mnt/a"));
        assert!(registry.is_empty());
    }
}
