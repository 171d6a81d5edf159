//! In-memory activity state.
//!
//! All maps support lock-free reads from any thread. Event handlers touch
//! `activity`, `open_files` and `pending`; only the sync path stores `loaded`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use dashmap::{DashMap, DashSet};

use crate::module::ModulePath;

pub struct ActivityState {
    /// Last access per module
    activity: DashMap<ModulePath, Instant>,
    /// Open file → owning module
    open_files: DashMap<PathBuf, ModulePath>,
    /// Opened but not yet loaded
    pending: DashSet<ModulePath>,
    loaded: ArcSwap<BTreeSet<ModulePath>>,
}

impl Default for ActivityState {
    fn default() -> Self {
        Self {
            activity: DashMap::new(),
            open_files: DashMap::new(),
            pending: DashSet::new(),
            loaded: ArcSwap::from_pointee(BTreeSet::from([ModulePath::root()])),
        }
    }
}

impl ActivityState {
    /// Record an access and track the open file.
    pub fn open(&self, file: PathBuf, module: ModulePath, now: Instant) {
        self.activity
            .entry(module.clone())
            .and_modify(|last| *last = (*last).max(now))
            .or_insert(now);
        self.open_files.insert(file, module);
    }

    /// Record an access without an open file.
    pub fn touch(&self, module: ModulePath, now: Instant) {
        self.activity
            .entry(module)
            .and_modify(|last| *last = (*last).max(now))
            .or_insert(now);
    }

    /// Stop tracking `file`. The module stays loaded.
    pub fn close(&self, file: &Path) -> Option<ModulePath> {
        self.open_files.remove(file).map(|(_, module)| module)
    }

    pub fn mark_pending(&self, module: ModulePath) {
        self.pending.insert(module);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear_pending(&self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn last_access(&self, module: &ModulePath) -> Option<Instant> {
        self.activity.get(module).map(|entry| *entry)
    }

    /// Snapshot of activity records.
    pub fn activity(&self) -> Vec<(ModulePath, Instant)> {
        self.activity
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn active_modules(&self) -> BTreeSet<ModulePath> {
        self.activity.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Modules with at least one open file.
    pub fn open_modules(&self) -> BTreeSet<ModulePath> {
        self.open_files.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn open_file_count(&self) -> usize {
        self.open_files.len()
    }

    /// Every module the state mentions, for staleness checks.
    pub fn tracked_modules(&self) -> BTreeSet<ModulePath> {
        let mut tracked: BTreeSet<_> = self.loaded.load().iter().cloned().collect();
        tracked.extend(self.active_modules());
        tracked.extend(self.open_modules());
        tracked.extend(self.pending.iter().map(|entry| entry.key().clone()));
        tracked
    }

    /// Drop the activity record only.
    pub fn release(&self, module: &ModulePath) {
        self.activity.remove(module);
    }

    /// Drop every trace of `module`.
    pub fn forget(&self, module: &ModulePath) {
        self.activity.remove(module);
        self.pending.remove(module);
        self.open_files.retain(|_, owner| owner != module);
    }

    pub fn loaded(&self) -> Arc<BTreeSet<ModulePath>> {
        self.loaded.load_full()
    }

    pub fn is_loaded(&self, module: &ModulePath) -> bool {
        self.loaded.load().contains(module)
    }

    /// Replace the loaded set. The root is always kept.
    pub fn store_loaded(&self, mut loaded: BTreeSet<ModulePath>) {
        loaded.insert(ModulePath::root());
        self.loaded.store(Arc::new(loaded));
    }

    pub fn clear(&self) {
        self.activity.clear();
        self.open_files.clear();
        self.pending.clear();
        self.store_loaded(BTreeSet::new());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn p(s: &str) -> ModulePath {
        ModulePath::parse(s).unwrap()
    }

    #[test]
    fn test_root_always_loaded() {
        let state = ActivityState::default();
        assert!(state.is_loaded(&ModulePath::root()));

        state.store_loaded(BTreeSet::from([p(":a")]));
        assert!(state.is_loaded(&ModulePath::root()));
        assert!(state.is_loaded(&p(":a")));

        state.clear();
        assert_eq!(state.loaded().len(), 1);
    }

    #[test]
    fn test_open_close_keeps_activity() {
        let state = ActivityState::default();
        let now = Instant::now();
        state.open(PathBuf::from("/r/a/A.kt"), p(":a"), now);
        assert_eq!(state.open_modules().len(), 1);

        assert_eq!(state.close(Path::new("/r/a/A.kt")), Some(p(":a")));
        assert!(state.open_modules().is_empty());
        assert_eq!(state.last_access(&p(":a")), Some(now));
    }

    #[test]
    fn test_access_never_moves_backwards() {
        let state = ActivityState::default();
        let t0 = Instant::now();
        state.touch(p(":a"), t0 + Duration::from_secs(10));
        state.touch(p(":a"), t0);
        assert_eq!(state.last_access(&p(":a")), Some(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_forget_cascades() {
        let state = ActivityState::default();
        let now = Instant::now();
        state.open(PathBuf::from("/r/a/A.kt"), p(":a"), now);
        state.open(PathBuf::from("/r/a/B.kt"), p(":a"), now);
        state.open(PathBuf::from("/r/b/B.kt"), p(":b"), now);
        state.mark_pending(p(":a"));

        state.forget(&p(":a"));
        assert!(state.last_access(&p(":a")).is_none());
        assert_eq!(state.open_file_count(), 1);
        assert_eq!(state.pending_count(), 0);
        assert!(!state.tracked_modules().contains(&p(":a")));
    }
}
