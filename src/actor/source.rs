//! Event sources feeding a [`SleepHandle`].
//!
//! - File watcher: a save counts as an open immediately followed by a close,
//!   which refreshes the module's activity.
//! - Stdin line protocol for editors: `open <path>`, `close <path>`, `sync`,
//!   `rescan`.

use std::io::BufRead;
use std::path::{Component, Path, PathBuf};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::service::SleepHandle;
use crate::module::Layout;
use crate::utils::path::resolve_path;

// ============================================================================
// file watcher
// ============================================================================

/// Keeps the OS watcher alive. Dropping it stops the bridge thread.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

/// Watch the project root and report saves to `handle`.
pub fn watch_files(handle: SleepHandle) -> notify::Result<FileWatcher> {
    let layout = handle.workspace().layout().clone();

    // notify is sync-only; bridge through a std channel and thread
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    watcher.watch(&layout.root, RecursiveMode::Recursive)?;

    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    for path in saved_paths(&event, &layout) {
                        crate::debug!("watch"; "saved {}", path.display());
                        handle.file_opened(&path);
                        handle.file_closed(&path);
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        }
    });

    Ok(FileWatcher { _watcher: watcher })
}

/// Files written by the user in `event`.
///
/// Metadata-only changes, editor artifacts, ignored directories and the
/// manifest itself are skipped.
pub fn saved_paths(event: &notify::Event, layout: &Layout) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) => {}
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => {}
        _ => return Vec::new(),
    }

    event
        .paths
        .iter()
        .filter(|path| !is_temp_file(path))
        .filter(|path| path.as_path() != layout.manifest)
        .filter(|path| !in_ignored_dir(path, layout))
        .filter(|path| !path.is_dir())
        .cloned()
        .collect()
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

fn in_ignored_dir(path: &Path, layout: &Layout) -> bool {
    let Ok(rel) = path.strip_prefix(&layout.root) else {
        return true;
    };
    let Some(parent) = rel.parent() else {
        return false;
    };
    parent.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| layout.is_ignored(n)),
        _ => false,
    })
}

// ============================================================================
// stdin protocol
// ============================================================================

/// One line of the stdin protocol.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Close(PathBuf),
    Sync,
    Rescan,
}

/// Parse a protocol line. Relative paths resolve against `root`.
pub fn parse_command(line: &str, root: &Path) -> Option<Command> {
    let line = line.trim();
    let (verb, arg) = match line.split_once([' ', '\t']) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };
    let path = || (!arg.is_empty()).then(|| resolve_path(Path::new(arg), root));

    match verb {
        "open" => path().map(Command::Open),
        "close" => path().map(Command::Close),
        "sync" if arg.is_empty() => Some(Command::Sync),
        "rescan" if arg.is_empty() => Some(Command::Rescan),
        _ => None,
    }
}

/// Read protocol lines from stdin until EOF.
pub fn read_stdin(handle: SleepHandle) -> std::thread::JoinHandle<()> {
    let root = handle.workspace().layout().root.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line, &root) {
                Some(Command::Open(path)) => handle.file_opened(&path),
                Some(Command::Close(path)) => handle.file_closed(&path),
                Some(Command::Sync) => handle.sync_now(),
                Some(Command::Rescan) => handle.workspace().rescan(),
                None => crate::log!("warning"; "unknown command: {}", line.trim()),
            }
        }
        crate::debug!("watch"; "stdin closed");
    })
}
