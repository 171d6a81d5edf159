use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::*;
use crate::config::test_config;
use crate::host::recording::RecordingHost;
use crate::module::fixture::{MANIFEST, MARKER, module};

const ORIGINAL: &str = "rootProject.name = \"demo\"\n";

fn p(s: &str) -> ModulePath {
    ModulePath::parse(s).unwrap()
}

fn set(paths: &[&str]) -> BTreeSet<ModulePath> {
    paths.iter().map(|s| p(s)).collect()
}

/// `lib/a → lib/b`, plus unrelated `lib/c` and `lib/d`.
fn tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(MARKER), "").unwrap();
    fs::write(temp.path().join(MANIFEST), ORIGINAL).unwrap();
    module(temp.path(), "lib/a", "dependencies {\n    api(project(\":lib:b\"))\n}\n");
    module(temp.path(), "lib/b", "");
    module(temp.path(), "lib/c", "");
    module(temp.path(), "lib/d", "");
    temp
}

fn workspace(temp: &TempDir, tweak: impl FnOnce(&mut WorkspaceConfig)) -> (Workspace, Arc<RecordingHost>) {
    let mut config = test_config(temp.path());
    tweak(&mut config);
    let host = Arc::new(RecordingHost::default());
    (Workspace::new(config, host.clone()), host)
}

/// Create a source file inside a module and return its path.
fn source(temp: &TempDir, rel: &str) -> PathBuf {
    let path = temp.path().join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "").unwrap();
    path
}

fn manifest(temp: &TempDir) -> String {
    fs::read_to_string(temp.path().join(MANIFEST)).unwrap()
}

fn loaded(ws: &Workspace) -> BTreeSet<ModulePath> {
    ws.state().loaded().iter().cloned().collect()
}

#[test]
fn test_open_loads_module_with_dependencies() {
    let temp = tree();
    let (ws, host) = workspace(&temp, |_| {});
    let file = source(&temp, "lib/a/src/main/kotlin/A.kt");

    assert!(ws.on_file_opened(&file, Instant::now()));
    let outcome = ws.sync().unwrap();

    assert_eq!(outcome, SyncOutcome::Applied(ApplyOutcome::Block { included: 2 }));
    assert_eq!(loaded(&ws), set(&[":", ":lib:a", ":lib:b"]));
    let text = manifest(&temp);
    assert!(text.contains("include(\":lib:a\")"));
    assert!(text.contains("include(\":lib:b\")"));
    assert!(!text.contains(":lib:c"));
    assert_eq!(host.reloads(), 1);
    assert_eq!(host.notes.lock().len(), 1);
}

#[test]
fn test_open_of_loaded_module_schedules_nothing() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let a = source(&temp, "lib/a/A.kt");
    let b = source(&temp, "lib/b/B.kt");

    ws.on_file_opened(&a, Instant::now());
    ws.sync().unwrap();
    assert!(!ws.on_file_opened(&a, Instant::now()));
    // :lib:b is loaded as a dependency
    assert!(!ws.on_file_opened(&b, Instant::now()));
}

#[test]
fn test_file_outside_modules_is_ignored() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let other = TempDir::new().unwrap();
    let file = other.path().join("Elsewhere.kt");
    fs::write(&file, "").unwrap();

    assert!(!ws.on_file_opened(&file, Instant::now()));
    assert_eq!(ws.state().open_file_count(), 0);
}

#[test]
fn test_sync_is_idempotent() {
    let temp = tree();
    let (ws, host) = workspace(&temp, |_| {});
    ws.on_file_opened(&source(&temp, "lib/a/A.kt"), Instant::now());

    ws.sync().unwrap();
    let first = manifest(&temp);
    assert_eq!(ws.sync().unwrap(), SyncOutcome::Applied(ApplyOutcome::Unchanged));
    assert_eq!(manifest(&temp), first);
    assert_eq!(host.reloads(), 1);
}

#[test]
fn test_idle_sweep_releases_only_expired() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |c| c.sleep.idle_timeout_minutes = 30);
    let t0 = Instant::now();
    let c = source(&temp, "lib/c/C.kt");
    let d = source(&temp, "lib/d/D.kt");

    ws.on_file_opened(&c, t0);
    ws.on_file_opened(&d, t0 + Duration::from_secs(2 * 60));
    ws.on_file_closed(&c);
    ws.on_file_closed(&d);
    ws.sync().unwrap();
    assert_eq!(loaded(&ws), set(&[":", ":lib:c", ":lib:d"]));

    // :lib:c idle 31 minutes, :lib:d idle 29 minutes
    ws.sweep(t0 + Duration::from_secs(31 * 60)).unwrap();
    assert_eq!(loaded(&ws), set(&[":", ":lib:d"]));
    assert!(ws.state().last_access(&p(":lib:c")).is_none());
    assert!(manifest(&temp).contains("include(\":lib:d\")"));
}

#[test]
fn test_idle_sweep_keeps_open_and_protected() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |c| c.sleep.pinned = vec!["c".to_string()]);
    let t0 = Instant::now();
    let c = source(&temp, "lib/c/C.kt");
    let d = source(&temp, "lib/d/D.kt");
    let b = source(&temp, "lib/b/B.kt");

    ws.on_file_opened(&c, t0);
    ws.on_file_closed(&c);
    ws.on_file_opened(&d, t0); // stays open
    ws.on_file_opened(&b, t0);
    ws.on_file_closed(&b);
    ws.sync().unwrap();

    ws.sweep(t0 + Duration::from_secs(60 * 60)).unwrap();
    assert_eq!(loaded(&ws), set(&[":", ":lib:c", ":lib:d"]));
}

#[test]
fn test_dependency_only_module_follows_its_dependent() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let t0 = Instant::now();
    let a = source(&temp, "lib/a/A.kt");

    ws.on_file_opened(&a, t0);
    ws.on_file_closed(&a);
    ws.sync().unwrap();
    assert!(loaded(&ws).contains(&p(":lib:b")));

    assert_eq!(
        ws.sweep(t0 + Duration::from_secs(31 * 60)).unwrap(),
        SyncOutcome::Applied(ApplyOutcome::Block { included: 0 })
    );
    assert_eq!(loaded(&ws), set(&[":"]));
    let text = manifest(&temp);
    assert!(!text.contains("include("));

    assert_eq!(
        ws.sweep(t0 + Duration::from_secs(32 * 60)).unwrap(),
        SyncOutcome::Applied(ApplyOutcome::Unchanged)
    );
    assert_eq!(manifest(&temp), text);
}

#[test]
fn test_last_idle_module_is_released() {
    let temp = tree();
    let (ws, host) = workspace(&temp, |c| c.sleep.idle_timeout_minutes = 30);
    let t0 = Instant::now();
    let c = source(&temp, "lib/c/C.kt");

    ws.on_file_opened(&c, t0);
    ws.on_file_closed(&c);
    ws.sync().unwrap();
    assert!(manifest(&temp).contains("include(\":lib:c\")"));

    ws.sweep(t0 + Duration::from_secs(31 * 60)).unwrap();
    assert_eq!(loaded(&ws), set(&[":"]));
    assert!(ws.state().last_access(&p(":lib:c")).is_none());
    assert!(!manifest(&temp).contains("include(\":lib:c\")"));
    assert_eq!(host.reloads(), 2);

    // Reopening brings it back
    assert!(ws.on_file_opened(&c, t0 + Duration::from_secs(40 * 60)));
    ws.sync().unwrap();
    assert!(manifest(&temp).contains("include(\":lib:c\")"));
}

#[test]
fn test_unmanaged_manifest_is_left_alone_when_nothing_is_active() {
    let temp = tree();
    let (ws, host) = workspace(&temp, |_| {});
    ws.state().mark_pending(p(":lib:c"));

    assert_eq!(ws.sync().unwrap(), SyncOutcome::Empty);
    assert_eq!(loaded(&ws), set(&[":"]));
    assert_eq!(ws.state().pending_count(), 0);
    assert_eq!(manifest(&temp), ORIGINAL);
    assert_eq!(host.reloads(), 0);
}

#[test]
fn test_deleted_dependency_is_not_reincluded() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let now = Instant::now();
    ws.on_file_opened(&source(&temp, "lib/a/A.kt"), now);
    ws.sync().unwrap();
    assert_eq!(loaded(&ws), set(&[":", ":lib:a", ":lib:b"]));

    fs::remove_dir_all(temp.path().join("lib/b")).unwrap();
    ws.sweep(now).unwrap();

    assert_eq!(loaded(&ws), set(&[":", ":lib:a"]));
    let text = manifest(&temp);
    assert!(text.contains("include(\":lib:a\")"));
    assert!(!text.contains(":lib:b"));
}

#[test]
fn test_deleted_module_is_purged_on_sweep() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let now = Instant::now();
    ws.on_file_opened(&source(&temp, "lib/c/C.kt"), now);
    ws.on_file_opened(&source(&temp, "lib/d/D.kt"), now);
    ws.sync().unwrap();

    fs::remove_dir_all(temp.path().join("lib/d")).unwrap();
    ws.sweep(now).unwrap();

    assert_eq!(loaded(&ws), set(&[":", ":lib:c"]));
    assert!(ws.state().last_access(&p(":lib:d")).is_none());
    assert_eq!(ws.state().open_file_count(), 1);
    let text = manifest(&temp);
    assert!(!text.contains(":lib:d"));
    assert!(text.contains("include(\":lib:c\")"));
}

#[test]
fn test_write_failure_keeps_loaded_set() {
    let temp = tree();
    let (ws, host) = workspace(&temp, |_| {});
    fs::create_dir(temp.path().join(format!(".{MANIFEST}.dormant-tmp"))).unwrap();
    ws.on_file_opened(&source(&temp, "lib/a/A.kt"), Instant::now());

    assert!(ws.sync().is_err());
    assert_eq!(loaded(&ws), set(&[":"]));
    assert_eq!(ws.state().pending_count(), 1);
    assert_eq!(manifest(&temp), ORIGINAL);
    assert_eq!(host.reloads(), 0);
}

#[test]
fn test_conflicting_manager_disables_once() {
    let temp = tree();
    let original = "plugins { id(\"com.dropbox.focus\") }\n";
    fs::write(temp.path().join(MANIFEST), original).unwrap();
    let (ws, host) = workspace(&temp, |_| {});
    let file = source(&temp, "lib/a/A.kt");

    assert!(ws.on_file_opened(&file, Instant::now()));
    assert_eq!(ws.sync().unwrap(), SyncOutcome::Disabled);
    assert_eq!(ws.sync().unwrap(), SyncOutcome::Disabled);
    assert!(ws.is_disabled());
    assert!(!ws.on_file_opened(&file, Instant::now()));

    assert_eq!(manifest(&temp), original);
    assert_eq!(host.notes.lock().len(), 1);
    assert_eq!(host.reloads(), 0);
}

#[test]
fn test_auto_sleep_follows_threshold() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |c| c.sleep.auto_sleep = None);
    assert!(!ws.is_auto_sleep_active());
    ws.on_file_opened(&source(&temp, "lib/a/A.kt"), Instant::now());
    assert_eq!(ws.sync().unwrap(), SyncOutcome::Inactive);
    assert_eq!(manifest(&temp), ORIGINAL);

    let (ws, _host) = workspace(&temp, |c| {
        c.sleep.auto_sleep = None;
        c.sleep.large_project_threshold = 3;
    });
    assert!(ws.is_auto_sleep_active());

    let (ws, _host) = workspace(&temp, |c| {
        c.sleep.auto_sleep = Some(false);
        c.sleep.large_project_threshold = 0;
    });
    assert!(!ws.is_auto_sleep_active());
}

#[test]
fn test_apply_now_ignores_auto_sleep() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |c| c.sleep.auto_sleep = Some(false));

    let outcome = ws.apply_now(&[p(":lib:a")], Instant::now()).unwrap();
    assert_eq!(outcome, SyncOutcome::Applied(ApplyOutcome::Block { included: 2 }));
    assert_eq!(loaded(&ws), set(&[":", ":lib:a", ":lib:b"]));
}

#[test]
fn test_restore_all_returns_original() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    ws.on_file_opened(&source(&temp, "lib/a/A.kt"), Instant::now());
    ws.sync().unwrap();
    assert_ne!(manifest(&temp), ORIGINAL);

    let outcome = ws.restore_all().unwrap();
    assert!(outcome.block_removed);
    assert_eq!(manifest(&temp), ORIGINAL);
    assert_eq!(loaded(&ws), set(&[":"]));
    assert_eq!(ws.state().open_file_count(), 0);
}

#[test]
fn test_dispose_stops_everything() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let file = source(&temp, "lib/a/A.kt");
    ws.on_file_opened(&file, Instant::now());

    ws.dispose();
    assert_eq!(ws.state().open_file_count(), 0);
    assert!(!ws.on_file_opened(&file, Instant::now()));
    assert_eq!(ws.sync().unwrap(), SyncOutcome::Disabled);
    assert_eq!(manifest(&temp), ORIGINAL);
}

#[test]
fn test_new_module_discovered_on_open() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let before = ws.module_count();
    module(temp.path(), "lib/e", "");

    assert!(ws.on_file_opened(&source(&temp, "lib/e/E.kt"), Instant::now()));
    assert_eq!(ws.module_count(), before + 1);
}

#[test]
fn test_status_snapshot() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |c| c.sleep.infra_suffixes = vec!["d".to_string()]);
    let now = Instant::now();
    ws.on_file_opened(&source(&temp, "lib/a/A.kt"), now);
    ws.sync().unwrap();

    let status = ws.status(now + Duration::from_secs(90));
    assert_eq!(status.modules, 4);
    assert!(status.managed);
    assert!(status.last_generated.is_some());
    assert_eq!(status.protected, vec![p(":lib:d")]);
    assert_eq!(status.activity[0].idle_secs, 90);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["loaded"][1], ":lib:a");
    assert_eq!(json["open_files"], 1);
}

#[test]
fn test_root_file_needs_no_sync() {
    let temp = tree();
    let (ws, _host) = workspace(&temp, |_| {});
    let file = source(&temp, "docs/README.md");
    assert!(!ws.on_file_opened(&file, Instant::now()));
    assert!(ws.state().open_modules().contains(&ModulePath::root()));
}
