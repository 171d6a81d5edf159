//! Dependency graph resolution.
//!
//! Edges are extracted from module declaration text (best-effort, see
//! [`scan`]) and the transitive closure is computed with an explicit
//! work queue. References that cannot be mapped to a module are reported,
//! never guessed, so the closure may under-approximate.
//!
//! ```text
//! seed ──▶ queue ──▶ parse_dependencies ──▶ unseen edges ──▶ queue
//!                          │
//!                          └── unresolved ──▶ warning (once)
//! ```

mod accessor;
mod scan;

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::fs;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::{DashMap, DashSet};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::module::{Layout, ModuleDescriptor, ModulePath};

pub use scan::Reference;

/// Why a reference was dropped from the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolveReason {
    /// No module matches the reference
    Missing,
    /// Several sibling modules share the expected prefix
    Ambiguous(Vec<ModulePath>),
}

impl fmt::Display for UnresolveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("no matching module"),
            Self::Ambiguous(candidates) => {
                let names: Vec<_> = candidates.iter().map(ModulePath::as_str).collect();
                write!(f, "ambiguous, candidates: {}", names.join(", "))
            }
        }
    }
}

/// A dependency edge that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDependency {
    pub from: ModulePath,
    pub reference: String,
    pub reason: String,
}

/// Parsed outgoing edges of one module.
#[derive(Debug, Default, Clone)]
pub struct Dependencies {
    pub modules: BTreeSet<ModulePath>,
    pub unresolved: Vec<UnresolvedDependency>,
}

/// Result of a transitive expansion.
#[derive(Debug, Default, Clone)]
pub struct Closure {
    pub modules: BTreeSet<ModulePath>,
    pub unresolved: Vec<UnresolvedDependency>,
}

struct CachedDeps {
    mtime: Option<SystemTime>,
    deps: Arc<Dependencies>,
}

/// Extracts and expands inter-module edges.
pub struct DependencyResolver {
    layout: Arc<Layout>,
    cache: DashMap<ModulePath, CachedDeps>,
    /// `module → reference` pairs already reported
    warned: DashSet<(ModulePath, String)>,
}

impl DependencyResolver {
    pub fn new(layout: Arc<Layout>) -> Self {
        Self {
            layout,
            cache: DashMap::new(),
            warned: DashSet::new(),
        }
    }

    /// Parse the outgoing edges of `module`.
    ///
    /// Results are memoised per module and refreshed when the declaration
    /// file's mtime changes. An unreadable declaration yields no edges.
    pub fn parse_dependencies(&self, module: &ModuleDescriptor) -> Arc<Dependencies> {
        let mtime = fs::metadata(&module.marker)
            .and_then(|m| m.modified())
            .ok();

        if let Some(cached) = self.cache.get(&module.path)
            && cached.mtime.is_some()
            && cached.mtime == mtime
        {
            return Arc::clone(&cached.deps);
        }

        let deps = Arc::new(self.parse_uncached(module));
        self.cache.insert(
            module.path.clone(),
            CachedDeps {
                mtime,
                deps: Arc::clone(&deps),
            },
        );
        deps
    }

    fn parse_uncached(&self, module: &ModuleDescriptor) -> Dependencies {
        let Ok(text) = fs::read_to_string(&module.marker) else {
            crate::debug!("deps"; "unreadable declaration: {}", module.marker.display());
            return Dependencies::default();
        };

        let mut deps = Dependencies::default();
        for reference in scan::scan_references(&text) {
            match self.resolve_reference(&reference) {
                Ok(path) if path == module.path || path.is_root() => {}
                Ok(path) => {
                    deps.modules.insert(path);
                }
                Err(reason) => {
                    self.warn_once(&module.path, &reference, &reason);
                    deps.unresolved.push(UnresolvedDependency {
                        from: module.path.clone(),
                        reference: reference.spelling(),
                        reason: reason.to_string(),
                    });
                }
            }
        }
        deps
    }

    fn resolve_reference(&self, reference: &Reference) -> Result<ModulePath, UnresolveReason> {
        match reference {
            Reference::Literal(raw) => {
                let path = ModulePath::parse(raw).ok_or(UnresolveReason::Missing)?;
                if path.is_root() || self.layout.describe_path(&path).is_some() {
                    Ok(path)
                } else {
                    Err(UnresolveReason::Missing)
                }
            }
            Reference::Accessor(segments) => accessor::resolve(&self.layout, segments),
        }
    }

    fn warn_once(&self, from: &ModulePath, reference: &Reference, reason: &UnresolveReason) {
        if self.warned.insert((from.clone(), reference.spelling())) {
            crate::log!("warning"; "{}: cannot resolve {} ({})", from, reference.spelling(), reason);
        }
    }

    /// Expand `seed` to its dependency closure.
    ///
    /// Breadth-first with a visited set; cycles terminate naturally. The
    /// result always contains the seed. Modules whose directory is gone
    /// contribute no edges, and memoised edges pointing at a vanished module
    /// are reported unresolved instead of followed.
    pub fn expand_transitively<I>(&self, seed: I) -> Closure
    where
        I: IntoIterator<Item = ModulePath>,
    {
        let mut closure = Closure::default();
        let mut visited: FxHashSet<ModulePath> = FxHashSet::default();
        let mut queue: VecDeque<ModulePath> = VecDeque::new();

        for path in seed {
            if visited.insert(path.clone()) {
                queue.push_back(path);
            }
        }

        while let Some(path) = queue.pop_front() {
            if let Some(desc) = self.layout.describe_path(&path) {
                let deps = self.parse_dependencies(&desc);
                for dep in &deps.modules {
                    if visited.contains(dep) {
                        continue;
                    }
                    if !dep.is_root() && self.layout.describe_path(dep).is_none() {
                        closure.unresolved.push(UnresolvedDependency {
                            from: path.clone(),
                            reference: dep.to_string(),
                            reason: UnresolveReason::Missing.to_string(),
                        });
                        continue;
                    }
                    visited.insert(dep.clone());
                    queue.push_back(dep.clone());
                }
                closure.unresolved.extend(deps.unresolved.iter().cloned());
            }
            closure.modules.insert(path);
        }

        closure
    }

    /// Forget memoised edges of a module.
    pub fn invalidate(&self, path: &ModulePath) {
        self.cache.remove(path);
    }
}
