//! Snapshot cache of built hierarchies.
//!
//! A hierarchy is never patched in place. Refreshing a design builds a new
//! one and swaps the `Arc` under the write lock, so a reader holding the
//! old snapshot keeps a consistent view until it drops it.

use crate::hierarchy::Hierarchy;
use bomtree_core::DesignId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Shared map from design to its latest hierarchy snapshot.
#[derive(Debug, Default)]
pub struct HierarchyCache {
    entries: RwLock<HashMap<DesignId, Arc<Hierarchy>>>,
}

impl HierarchyCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot for a design.
    pub fn get(&self, design_id: &str) -> Option<Arc<Hierarchy>> {
        self.entries.read().get(design_id).cloned()
    }

    /// Stores a snapshot, replacing any previous one for the same design.
    ///
    /// Returns the replaced snapshot.
    pub fn insert(&self, hierarchy: Hierarchy) -> Option<Arc<Hierarchy>> {
        let design_id = hierarchy.design_id().to_string();
        let snapshot = Arc::new(hierarchy);
        let previous = self.entries.write().insert(design_id.clone(), snapshot);
        debug!(design = %design_id, replaced = previous.is_some(), "Cached hierarchy");
        previous
    }

    /// Returns the cached snapshot or builds, stores and returns a new one.
    pub fn get_or_build<F>(&self, design_id: &str, build: F) -> Arc<Hierarchy>
    where
        F: FnOnce() -> Hierarchy,
    {
        if let Some(existing) = self.get(design_id) {
            return existing;
        }

        let built = Arc::new(build());
        let mut entries = self.entries.write();
        // Another caller may have stored one while we were building
        entries
            .entry(design_id.to_string())
            .or_insert(built)
            .clone()
    }

    /// Drops the snapshot for a design.
    pub fn invalidate(&self, design_id: &str) -> bool {
        self.entries.write().remove(design_id).is_some()
    }

    /// Number of cached designs.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use bomtree_core::NodeRecord;
    use std::thread;

    fn hierarchy(design: &str, names: &[&str]) -> Hierarchy {
        let mut builder = HierarchyBuilder::new(design);
        builder.add_records(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    NodeRecord::new(format!("{design}-{i}"), design, *name, "PART", format!("{i}"))
                })
                .collect(),
        );
        builder.build()
    }

    #[test]
    fn test_insert_replaces_snapshot() {
        let cache = HierarchyCache::new();
        assert!(cache.insert(hierarchy("d", &["Old"])).is_none());

        let held = cache.get("d").unwrap();
        let previous = cache.insert(hierarchy("d", &["New", "Extra"]));

        assert!(previous.is_some());
        // Readers keep the snapshot they took
        assert_eq!(held.len(), 1);
        assert_eq!(cache.get("d").unwrap().len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_or_build_builds_once() {
        let cache = HierarchyCache::new();
        let first = cache.get_or_build("d", || hierarchy("d", &["A"]));
        let second = cache.get_or_build("d", || panic!("should not rebuild"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_invalidate() {
        let cache = HierarchyCache::new();
        cache.insert(hierarchy("d", &["A"]));
        assert!(cache.invalidate("d"));
        assert!(!cache.invalidate("d"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers() {
        let cache = Arc::new(HierarchyCache::new());
        cache.insert(hierarchy("d", &["A", "B"]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get("d").map(|h| h.len()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(2));
        }
    }
}
