//! Stale entry reconciliation.
//!
//! Modules can be renamed or deleted while tracked. Before every sync the
//! tracked set is checked against disk and vanished modules are dropped from
//! every map, so they never reach the manifest.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::module::{Layout, ModulePath};
use crate::workspace::ActivityState;

/// Result of one purge pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Purge {
    /// Surviving members of the loaded set
    pub kept: BTreeSet<ModulePath>,
    /// Modules removed from the state
    pub purged: Vec<ModulePath>,
}

pub struct StaleEntryReconciler {
    layout: Arc<Layout>,
}

impl StaleEntryReconciler {
    pub fn new(layout: Arc<Layout>) -> Self {
        Self { layout }
    }

    /// Whether `module` still has its directory and declaration marker.
    /// The root never goes stale.
    pub fn is_live(&self, module: &ModulePath) -> bool {
        module.is_root()
            || self
                .layout
                .describe_path(module)
                .is_some_and(|desc| desc.is_present())
    }

    /// Drop vanished modules from `state` and return what is left of `loaded`.
    pub fn purge_stale(&self, loaded: &BTreeSet<ModulePath>, state: &ActivityState) -> Purge {
        let mut purge = Purge::default();

        for module in state.tracked_modules().union(loaded) {
            if self.is_live(module) {
                if loaded.contains(module) {
                    purge.kept.insert(module.clone());
                }
            } else {
                crate::debug!("sleep"; "purging stale module {}", module);
                state.forget(module);
                purge.purged.push(module.clone());
            }
        }

        purge
    }
}
