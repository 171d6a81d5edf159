//! Per-workspace sleep coordinator.
//!
//! [`Workspace`] is the context object holding everything one project needs:
//! configuration, the module index, the resolver, the manifest rewriter and
//! the in-memory [`ActivityState`]. It is created at startup and torn down
//! with [`Workspace::dispose`].
//!
//! ```text
//! on_file_opened ─┐                          ┌─▶ purge_stale
//! on_file_closed ─┼─▶ ActivityState ─▶ sync ─┼─▶ expand_transitively
//! sweep ──────────┘      (maps)       (lock) └─▶ apply ─▶ reload
//! ```
//!
//! Event handlers only do map bookkeeping. All manifest writes and every
//! store of the loaded set go through `sync`, serialized by one mutex.

mod protect;
mod state;

#[cfg(test)]
mod tests;

pub use state::ActivityState;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::config::WorkspaceConfig;
use crate::host::Host;
use crate::log;
use crate::manifest::{ApplyOutcome, ManifestError, ManifestRewriter, RestoreOutcome};
use crate::module::{InfraMatcher, Layout, ModuleDescriptor, ModuleIndex, ModulePath};
use crate::reconcile::StaleEntryReconciler;
use crate::resolver::{Closure, DependencyResolver};
use crate::utils::plural::plural_count;

/// What a sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Disabled by a conflicting manager, or disposed
    Disabled,
    /// Auto sleep is off for this project
    Inactive,
    /// Nothing but root and infra modules active and the manifest was never
    /// managed; the file is left alone
    Empty,
    Applied(ApplyOutcome),
}

/// Serializable snapshot for `status`.
#[derive(Debug, Serialize)]
pub struct WorkspaceStatus {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub modules: usize,
    pub auto_sleep_active: bool,
    pub disabled: bool,
    pub managed: bool,
    pub last_generated: Option<String>,
    pub loaded: Vec<ModulePath>,
    pub protected: Vec<ModulePath>,
    pub open_files: usize,
    pub pending: usize,
    pub activity: Vec<ActivityEntry>,
}

#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub module: ModulePath,
    pub idle_secs: u64,
}

pub struct Workspace {
    config: WorkspaceConfig,
    layout: Arc<Layout>,
    index: RwLock<ModuleIndex>,
    infra: InfraMatcher,
    resolver: DependencyResolver,
    reconciler: StaleEntryReconciler,
    rewriter: ManifestRewriter,
    host: Arc<dyn Host>,
    state: ActivityState,
    /// Single-writer path for the manifest and the loaded set
    sync_guard: Mutex<()>,
    disabled: AtomicBool,
    disposed: AtomicBool,
}

impl Workspace {
    /// Build the context and discover modules.
    pub fn new(config: WorkspaceConfig, host: Arc<dyn Host>) -> Self {
        let layout = Arc::new(Layout::from_config(&config));
        let infra = InfraMatcher::new(config.sleep.infra_suffixes.iter().cloned());
        let index = ModuleIndex::scan(&layout);
        let rewriter = ManifestRewriter::new(layout.manifest.clone(), infra.clone(), Arc::clone(&host));

        Self {
            resolver: DependencyResolver::new(Arc::clone(&layout)),
            reconciler: StaleEntryReconciler::new(Arc::clone(&layout)),
            index: RwLock::new(index),
            config,
            layout,
            infra,
            rewriter,
            host,
            state: ActivityState::default(),
            sync_guard: Mutex::new(()),
            disabled: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn state(&self) -> &ActivityState {
        &self.state
    }

    pub fn module_count(&self) -> usize {
        self.index.read().len()
    }

    /// Look up a module, discovering it on demand.
    pub fn module(&self, path: &ModulePath) -> Option<ModuleDescriptor> {
        if let Some(desc) = self.index.read().get(path) {
            return Some(desc.clone());
        }
        let desc = self.layout.describe_path(path)?;
        self.index.write().insert(desc.clone());
        Some(desc)
    }

    /// Re-walk the tree.
    pub fn rescan(&self) {
        *self.index.write() = ModuleIndex::scan(&self.layout);
    }

    // ========================================================================
    // events
    // ========================================================================

    /// Record an opened file. Returns `true` when a sync should be scheduled.
    ///
    /// Files outside any module are ignored.
    pub fn on_file_opened(&self, file: &Path, now: Instant) -> bool {
        if self.is_disabled() {
            return false;
        }
        let Some(owner) = self.layout.owner_of(file) else {
            return false;
        };
        {
            let index = self.index.read();
            if !index.contains(&owner.path) {
                drop(index);
                crate::debug!("sleep"; "discovered {}", owner.path);
                self.index.write().insert(owner.clone());
            }
        }

        let module = owner.path;
        self.state.open(file.to_path_buf(), module.clone(), now);
        if self.state.is_loaded(&module) {
            return false;
        }
        crate::debug!("sleep"; "{} requested by {}", module, file.display());
        self.state.mark_pending(module);
        true
    }

    /// Forget an open file. The module stays loaded until the idle sweep.
    pub fn on_file_closed(&self, file: &Path) {
        self.state.close(file);
    }

    // ========================================================================
    // policy
    // ========================================================================

    /// Explicit setting wins; otherwise only large projects sleep modules.
    pub fn is_auto_sleep_active(&self) -> bool {
        self.config
            .sleep
            .auto_sleep
            .unwrap_or_else(|| self.module_count() > self.config.sleep.large_project_threshold)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst) || self.disposed.load(Ordering::SeqCst)
    }

    /// Disable once when another tool manages module inclusion.
    fn check_conflict(&self) -> bool {
        if self.disabled.load(Ordering::SeqCst) {
            return true;
        }
        let Some(marker) = self.rewriter.find_marker(&self.config.project.conflict_markers) else {
            return false;
        };
        if !self.disabled.swap(true, Ordering::SeqCst) {
            crate::logger::status_warning(&format!(
                "`{}` found in {}, another tool manages modules; sleeping disabled",
                marker,
                self.layout.manifest.display()
            ));
            self.host.notify(
                "module sleep disabled",
                &format!("{} already manages module inclusion", marker),
            );
        }
        true
    }

    /// Infra and pinned modules, closed under dependencies.
    pub fn protected(&self) -> BTreeSet<ModulePath> {
        let seed = protect::protected_seed(
            &self.index.read(),
            &self.infra,
            &self.config.sleep.pinned,
        );
        self.resolver.expand_transitively(seed).modules
    }

    // ========================================================================
    // sync
    // ========================================================================

    /// Bring the manifest in line with current activity.
    ///
    /// Skipped when auto sleep is inactive. On failure the previous loaded
    /// set is kept.
    pub fn sync(&self) -> Result<SyncOutcome, ManifestError> {
        let _guard = self.sync_guard.lock();
        if !self.is_auto_sleep_active() {
            return Ok(SyncOutcome::Inactive);
        }
        self.sync_locked()
    }

    /// Load `targets` (and their closure) now, regardless of auto sleep.
    pub fn apply_now(&self, targets: &[ModulePath], now: Instant) -> Result<SyncOutcome, ManifestError> {
        let _guard = self.sync_guard.lock();
        for target in targets {
            self.state.touch(target.clone(), now);
        }
        self.sync_locked()
    }

    /// Release modules idle beyond the timeout, then sync.
    ///
    /// Open and protected modules are never released.
    pub fn sweep(&self, now: Instant) -> Result<SyncOutcome, ManifestError> {
        if self.is_disabled() || !self.is_auto_sleep_active() {
            return Ok(SyncOutcome::Inactive);
        }
        let timeout = self.config.sleep.idle_timeout();
        let open = self.state.open_modules();
        let protected = self.protected();

        let mut released = 0;
        for (module, last) in self.state.activity() {
            if now.saturating_duration_since(last) > timeout
                && !open.contains(&module)
                && !protected.contains(&module)
            {
                crate::debug!("sleep"; "releasing idle {}", module);
                self.state.release(&module);
                released += 1;
            }
        }
        if released > 0 {
            log!("sleep"; "released {}", plural_count(released, "idle module"));
        }

        self.sync()
    }

    fn sync_locked(&self) -> Result<SyncOutcome, ManifestError> {
        if self.is_disabled() || self.check_conflict() {
            return Ok(SyncOutcome::Disabled);
        }

        let purge = self.reconciler.purge_stale(&self.state.loaded(), &self.state);
        if !purge.purged.is_empty() {
            let mut index = self.index.write();
            for module in &purge.purged {
                index.remove(module);
                self.resolver.invalidate(module);
            }
        }

        let mut seed = self.state.active_modules();
        seed.extend(self.state.open_modules());
        seed.extend(self.protected());
        seed.insert(ModulePath::root());
        let closure = self.resolver.expand_transitively(seed);

        match self.rewriter.apply(&closure.modules, self.module_count()) {
            Ok(outcome) => {
                if self.disposed.load(Ordering::SeqCst) {
                    return Ok(SyncOutcome::Disabled);
                }
                self.report(&closure, outcome);
                self.state.store_loaded(closure.modules);
                self.state.clear_pending();
                Ok(SyncOutcome::Applied(outcome))
            }
            Err(ManifestError::EmptyActiveSet) => {
                // Unmanaged manifest: nothing was ever slept, so nothing to release
                crate::debug!("sleep"; "nothing to include yet, manifest left alone");
                if !self.disposed.load(Ordering::SeqCst) {
                    self.state.store_loaded(closure.modules);
                    self.state.clear_pending();
                }
                Ok(SyncOutcome::Empty)
            }
            Err(e) => {
                crate::logger::status_error("manifest update failed", &e.to_string());
                Err(e)
            }
        }
    }

    fn report(&self, closure: &Closure, outcome: ApplyOutcome) {
        if !outcome.wrote() {
            return;
        }
        let included = closure.modules.iter().filter(|p| !p.is_root()).count();
        let sleeping = self.module_count().saturating_sub(included);
        self.host.notify(
            "manifest updated",
            &format!("{} included, {} sleeping", included, sleeping),
        );
    }

    // ========================================================================
    // teardown
    // ========================================================================

    /// Undo all managed state in the manifest and forget activity.
    pub fn restore_all(&self) -> Result<RestoreOutcome, ManifestError> {
        let _guard = self.sync_guard.lock();
        let outcome = self.rewriter.restore()?;
        self.state.clear();
        if outcome.wrote() {
            self.host.notify("manifest restored", "all modules included");
        }
        Ok(outcome)
    }

    /// Stop reacting to events and clear all maps.
    ///
    /// A sync already running finishes its write; its result is discarded.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.state.clear();
    }

    // ========================================================================
    // reporting
    // ========================================================================

    pub fn status(&self, now: Instant) -> WorkspaceStatus {
        let mut activity: Vec<_> = self
            .state
            .activity()
            .into_iter()
            .map(|(module, last)| ActivityEntry {
                module,
                idle_secs: now.saturating_duration_since(last).as_secs(),
            })
            .collect();
        activity.sort_by(|a, b| a.module.cmp(&b.module));

        WorkspaceStatus {
            root: self.layout.root.clone(),
            manifest: self.layout.manifest.clone(),
            modules: self.module_count(),
            auto_sleep_active: self.is_auto_sleep_active(),
            disabled: self.is_disabled()
                || self
                    .rewriter
                    .find_marker(&self.config.project.conflict_markers)
                    .is_some(),
            managed: self.rewriter.is_managed(),
            last_generated: self.rewriter.last_generated().map(|dt| dt.to_rfc3339()),
            loaded: self.state.loaded().iter().cloned().collect(),
            protected: self.protected().into_iter().collect(),
            open_files: self.state.open_file_count(),
            pending: self.state.pending_count(),
            activity,
        }
    }
}
