//! Module discovery.
//!
//! Walks the project tree in parallel and records every directory that holds
//! a declaration marker. Hidden and ignored directories are never entered.

use std::collections::BTreeMap;

use jwalk::WalkDir;

use super::{Layout, ModuleDescriptor, ModulePath};

/// All known modules of a workspace, keyed by path.
#[derive(Debug, Default, Clone)]
pub struct ModuleIndex {
    modules: BTreeMap<ModulePath, ModuleDescriptor>,
}

impl ModuleIndex {
    /// Discover every module under the layout root.
    pub fn scan(layout: &Layout) -> Self {
        let ignore = layout.ignore_set();
        let walker = WalkDir::new(&layout.root)
            .skip_hidden(true)
            .process_read_dir(move |_, _, _, children| {
                children.retain(|entry| {
                    entry.as_ref().is_ok_and(|entry| {
                        !entry.file_type().is_dir()
                            || !entry.file_name.to_str().is_some_and(|n| ignore.contains(n))
                    })
                });
            });

        let mut index = Self::default();
        for entry in walker.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let is_marker = entry
                .file_name
                .to_str()
                .is_some_and(|name| layout.markers().iter().any(|m| m == name));
            if !is_marker {
                continue;
            }
            let path = entry.path();
            let Some(dir) = path.parent() else {
                continue;
            };
            // describe() applies marker precedence when a directory holds several
            if let Some(desc) = layout.describe(dir) {
                index.modules.entry(desc.path.clone()).or_insert(desc);
            }
        }

        crate::debug!("scan"; "discovered {} modules under {}", index.len(), layout.root.display());
        index
    }

    pub fn get(&self, path: &ModulePath) -> Option<&ModuleDescriptor> {
        self.modules.get(path)
    }

    pub fn contains(&self, path: &ModulePath) -> bool {
        self.modules.contains_key(path)
    }

    /// Record a lazily discovered module. Existing entries are kept.
    pub fn insert(&mut self, desc: ModuleDescriptor) {
        self.modules.entry(desc.path.clone()).or_insert(desc);
    }

    pub fn remove(&mut self, path: &ModulePath) -> Option<ModuleDescriptor> {
        self.modules.remove(path)
    }

    /// Number of modules, not counting the root.
    pub fn len(&self) -> usize {
        self.modules.keys().filter(|p| !p.is_root()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &ModulePath> {
        self.modules.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{module, project};
    use super::*;

    #[test]
    fn test_scan_finds_nested_modules() {
        let (temp, layout) = project();
        module(temp.path(), "app", "");
        module(temp.path(), "lib/foo", "");
        module(temp.path(), "lib/foo/nested", "");
        std::fs::create_dir_all(temp.path().join("lib/not-a-module")).unwrap();

        let index = ModuleIndex::scan(&layout);
        let paths: Vec<_> = index.paths().map(ModulePath::as_str).collect();
        assert_eq!(paths, vec![":", ":app", ":lib:foo", ":lib:foo:nested"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_scan_skips_ignored_and_hidden() {
        let (temp, layout) = project();
        module(temp.path(), "lib/foo", "");
        module(temp.path(), "build/generated", "");
        module(temp.path(), ".gradle/cache", "");

        let index = ModuleIndex::scan(&layout);
        assert_eq!(index.len(), 1);
        assert!(index.contains(&ModulePath::parse(":lib:foo").unwrap()));
    }

    #[test]
    fn test_insert_and_remove() {
        let (temp, layout) = project();
        let mut index = ModuleIndex::scan(&layout);
        assert!(index.is_empty());

        module(temp.path(), "late", "");
        let desc = layout.describe(&layout.root.join("late")).unwrap();
        index.insert(desc);
        assert_eq!(index.len(), 1);

        assert!(index.remove(&ModulePath::parse(":late").unwrap()).is_some());
        assert!(index.is_empty());
    }
}
