//! `dormant watch`: run the sleep service until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, bounded};

use super::common::open_workspace;
use crate::actor::SleepService;
use crate::actor::source::{read_stdin, watch_files};
use crate::config::WorkspaceConfig;
use crate::utils::plural::plural_count;
use crate::workspace::Workspace;
use crate::{debug, log};

/// Interval between shutdown checks in the runtime loop
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub fn run_watch(config: WorkspaceConfig, stdin: bool) -> Result<()> {
    let workspace = Arc::new(open_workspace(config));
    log_summary(&workspace);

    let shutdown_rx = shutdown_signal()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        let handle = SleepService::start(Arc::clone(&workspace));

        // Held until shutdown; dropping it stops the OS watcher
        let _watcher = match watch_files(handle.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log!("watch"; "file watcher unavailable: {}", e);
                None
            }
        };
        if stdin {
            // Detached: blocked on stdin until EOF or process exit
            let _ = read_stdin(handle.clone());
        }

        loop {
            if shutdown_rx.try_recv().is_ok() {
                debug!("watch"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }

        handle.dispose().await;
    });

    if workspace.config().sleep.restore_on_exit {
        let outcome = workspace.restore_all()?;
        if outcome.wrote() {
            log!("manifest"; "restored {}", workspace.layout().manifest.display());
        }
    } else {
        debug!("watch"; "keeping manifest as is");
    }
    Ok(())
}

/// Route Ctrl+C into a channel polled by the runtime loop.
fn shutdown_signal() -> Result<Receiver<()>> {
    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })
    .context("failed to set Ctrl+C handler")?;
    Ok(rx)
}

fn log_summary(workspace: &Workspace) {
    let config = workspace.config();
    let modules = plural_count(workspace.module_count(), "module");
    if workspace.is_auto_sleep_active() {
        log!(
            "watch";
            "{} under {}, idle timeout {}m",
            modules,
            workspace.layout().root.display(),
            config.sleep.idle_timeout_minutes
        );
    } else {
        log!(
            "watch";
            "{} (threshold {}), auto sleep inactive",
            modules,
            config.sleep.large_project_threshold
        );
    }
}
