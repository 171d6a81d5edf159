//! Module model: paths, descriptors, and project layout.
//!
//! A directory is a module when it holds a declaration marker file
//! (`build.gradle.kts` by default). The project root is always a module.
//!
//! ```text
//! repo/                      ← root  (:)
//! ├── settings.gradle.kts    ← manifest
//! ├── build.gradle.kts
//! └── lib/
//!     ├── foo/               ← :lib:foo
//!     │   └── build.gradle.kts
//!     └── docs/              ← not a module (no marker)
//! ```

mod index;
mod infra;
mod path;

pub use index::ModuleIndex;
pub use infra::InfraMatcher;
pub use path::ModulePath;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::config::WorkspaceConfig;
use crate::utils::path::normalize_path;

/// A discovered module. Immutable once found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub path: ModulePath,
    /// Folder name (project directory name for the root module)
    pub display_name: String,
    /// Absolute module directory
    pub dir: PathBuf,
    /// Absolute path of the declaration marker file
    pub marker: PathBuf,
}

impl ModuleDescriptor {
    /// Whether the backing directory and marker still exist.
    pub fn is_present(&self) -> bool {
        self.dir.is_dir() && self.marker.is_file()
    }
}

/// Where things live on disk for one workspace.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Normalized project root
    pub root: PathBuf,
    /// Absolute manifest path
    pub manifest: PathBuf,
    markers: Vec<String>,
    ignore: Arc<FxHashSet<String>>,
}

impl Layout {
    pub fn new(
        root: &Path,
        manifest: &str,
        markers: Vec<String>,
        ignore: impl IntoIterator<Item = String>,
    ) -> Self {
        let root = normalize_path(root);
        Self {
            manifest: root.join(manifest),
            root,
            markers,
            ignore: Arc::new(ignore.into_iter().collect()),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(
            config.get_root(),
            &config.project.manifest,
            config.project.markers.clone(),
            config.project.ignore.iter().cloned(),
        )
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Directory names skipped during discovery.
    pub fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore.contains(name)
    }

    pub(crate) fn ignore_set(&self) -> Arc<FxHashSet<String>> {
        Arc::clone(&self.ignore)
    }

    /// First marker file present in `dir`, in configured precedence order.
    pub fn marker_in(&self, dir: &Path) -> Option<PathBuf> {
        self.markers
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Describe `dir` as a module if it lies under the root and holds a marker.
    pub fn describe(&self, dir: &Path) -> Option<ModuleDescriptor> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        let marker = self.marker_in(dir)?;
        let path = ModulePath::from_relative_dir(rel)?;
        let display_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(ModuleDescriptor {
            path,
            display_name,
            dir: dir.to_path_buf(),
            marker,
        })
    }

    /// Describe a module by path, using the conventional directory layout.
    pub fn describe_path(&self, path: &ModulePath) -> Option<ModuleDescriptor> {
        self.describe(&path.to_dir(&self.root))
    }

    /// Find the module owning `file` by walking up its ancestors.
    ///
    /// Stops at the project root. Files outside the root have no owner.
    pub fn owner_of(&self, file: &Path) -> Option<ModuleDescriptor> {
        let file = normalize_path(file);
        if !file.starts_with(&self.root) {
            return None;
        }
        let start = if file.is_dir() {
            file.as_path()
        } else {
            file.parent()?
        };
        start
            .ancestors()
            .take_while(|dir| dir.starts_with(&self.root))
            .find_map(|dir| self.describe(dir))
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Fake module trees for tests.

    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::Layout;

    pub const MARKER: &str = "build.gradle.kts";
    pub const MANIFEST: &str = "settings.gradle.kts";

    /// Temp project with a root marker and an empty manifest.
    pub fn project() -> (TempDir, Layout) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MARKER), "").unwrap();
        fs::write(temp.path().join(MANIFEST), "rootProject.name = \"demo\"\n").unwrap();
        let layout = Layout::new(
            temp.path(),
            MANIFEST,
            vec![MARKER.to_string()],
            ["build".to_string()],
        );
        (temp, layout)
    }

    /// Create a module directory (`lib/foo`) with declaration text.
    pub fn module(root: &Path, rel: &str, declaration: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MARKER), declaration).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::{module, project};
    use super::*;

    #[test]
    fn test_owner_walks_up_to_marker() {
        let (temp, layout) = project();
        module(temp.path(), "lib/foo", "");
        let src = temp.path().join("lib/foo/src/main/kotlin");
        std::fs::create_dir_all(&src).unwrap();
        let file = src.join("Foo.kt");
        std::fs::write(&file, "class Foo").unwrap();

        let owner = layout.owner_of(&file).unwrap();
        assert_eq!(owner.path.as_str(), ":lib:foo");
        assert_eq!(owner.display_name, "foo");
    }

    #[test]
    fn test_owner_falls_back_to_root() {
        let (temp, layout) = project();
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("README.md"), "").unwrap();

        let owner = layout.owner_of(&docs.join("README.md")).unwrap();
        assert!(owner.path.is_root());
    }

    #[test]
    fn test_owner_outside_root_is_none() {
        let (_temp, layout) = project();
        let other = tempfile::TempDir::new().unwrap();
        assert!(layout.owner_of(&other.path().join("x.kt")).is_none());
    }

    #[test]
    fn test_describe_requires_marker() {
        let (temp, layout) = project();
        std::fs::create_dir_all(temp.path().join("lib/plain")).unwrap();
        assert!(layout.describe(&temp.path().join("lib/plain")).is_none());

        module(temp.path(), "lib/real", "");
        let desc = layout.describe_path(&ModulePath::parse(":lib:real").unwrap()).unwrap();
        assert!(desc.is_present());
    }
}
