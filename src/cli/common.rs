//! Common utilities shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};

use crate::config::WorkspaceConfig;
use crate::host::TerminalHost;
use crate::module::ModulePath;
use crate::utils::path::resolve_path;
use crate::workspace::Workspace;

/// Build the workspace context with the terminal host.
pub fn open_workspace(config: WorkspaceConfig) -> Workspace {
    let host = TerminalHost::new(
        config.get_root().to_path_buf(),
        config
            .project
            .reload_command
            .clone()
            .filter(|c| !c.trim().is_empty()),
    );
    Workspace::new(config, Arc::new(host))
}

/// Resolve a CLI target: a module path (`:lib:foo`) or a directory/file.
///
/// Paths resolve against the current directory first, then the project root.
pub fn resolve_target(workspace: &Workspace, target: &str) -> Result<ModulePath> {
    if target.starts_with(':') {
        let Some(path) = ModulePath::parse(target) else {
            bail!("invalid module path `{}`", target);
        };
        if workspace.module(&path).is_none() && !path.is_root() {
            bail!("no module `{}` under {}", path, workspace.layout().root.display());
        }
        return Ok(path);
    }

    let path = resolve_path(Path::new(target), &workspace.layout().root);
    if !path.exists() {
        bail!("`{}` does not exist", path.display());
    }
    match workspace.layout().owner_of(&path) {
        Some(owner) => Ok(owner.path),
        None => bail!("`{}` is outside the project", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::host::recording::RecordingHost;
    use crate::module::fixture::{MANIFEST, MARKER, module};

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(MARKER), "").unwrap();
        std::fs::write(temp.path().join(MANIFEST), "").unwrap();
        module(temp.path(), "lib/foo", "");
        let ws = Workspace::new(test_config(temp.path()), Arc::new(RecordingHost::default()));
        (temp, ws)
    }

    #[test]
    fn test_resolve_module_path() {
        let (_temp, ws) = workspace();
        assert_eq!(resolve_target(&ws, ":lib:foo").unwrap().as_str(), ":lib:foo");
        assert!(resolve_target(&ws, ":lib:missing").is_err());
        assert!(resolve_target(&ws, ":lib::x").is_err());
    }

    #[test]
    fn test_resolve_directory() {
        let (temp, ws) = workspace();
        let dir = temp.path().join("lib/foo/src");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.to_string_lossy();
        assert_eq!(resolve_target(&ws, &target).unwrap().as_str(), ":lib:foo");

        let outside = tempfile::TempDir::new().unwrap();
        assert!(resolve_target(&ws, &outside.path().to_string_lossy()).is_err());
    }
}
