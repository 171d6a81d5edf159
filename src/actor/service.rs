//! Sleep service actor.
//!
//! Owns the debounce timer and the periodic idle sweep. Event callbacks run
//! on the caller's thread through [`SleepHandle`]: they update the workspace
//! maps and post a message, nothing more.
//!
//! ```text
//! file_opened ──▶ Workspace::on_file_opened ──▶ Schedule ──▶ Debouncer ─┐
//! sweep tick ──────────────────────────────────────────────────────────┼─▶ sync
//! sync_now ─────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::debouncer::Debouncer;
use super::messages::SleepMsg;
use crate::manifest::{ManifestError, RestoreOutcome};
use crate::workspace::{SyncOutcome, Workspace};

/// How long `dispose` waits for the actor to finish an in-flight sync.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Debounced, periodic driver for one [`Workspace`].
pub struct SleepService {
    workspace: Arc<Workspace>,
    rx: mpsc::UnboundedReceiver<SleepMsg>,
    debouncer: Debouncer,
}

/// Cloneable front end of a running [`SleepService`].
#[derive(Clone)]
pub struct SleepHandle {
    workspace: Arc<Workspace>,
    tx: mpsc::UnboundedSender<SleepMsg>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SleepService {
    /// Spawn the actor on the current tokio runtime.
    pub fn start(workspace: Arc<Workspace>) -> SleepHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            debouncer: Debouncer::new(workspace.config().sleep.debounce()),
            workspace: Arc::clone(&workspace),
            rx,
        };
        let task = tokio::spawn(service.run());
        crate::debug!("sleep"; "service started");

        SleepHandle {
            workspace,
            tx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn run(mut self) {
        let period = self.workspace.config().sleep.sweep_interval();
        let mut sweep = tokio::time::interval_at(Instant::now() + period, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wait = self.debouncer.sleep_duration(Instant::now());
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(SleepMsg::Schedule) => self.debouncer.arm(Instant::now()),
                    Some(SleepMsg::SyncNow) => {
                        self.debouncer.cancel();
                        self.sync();
                    }
                    Some(SleepMsg::RestoreAll(reply)) => {
                        self.debouncer.cancel();
                        let _ = reply.send(self.workspace.restore_all());
                    }
                    Some(SleepMsg::Shutdown) | None => break,
                },
                _ = tokio::time::sleep(wait), if self.debouncer.is_armed() => {
                    if self.debouncer.take_if_due(Instant::now()) {
                        self.sync();
                    }
                }
                _ = sweep.tick() => {
                    let now = std::time::Instant::now();
                    report(self.workspace.sweep(now));
                }
            }
        }

        crate::debug!("sleep"; "service stopped");
    }

    fn sync(&self) {
        report(self.workspace.sync());
    }
}

fn report(result: Result<SyncOutcome, ManifestError>) {
    match result {
        Ok(outcome) => crate::debug!("sleep"; "sync: {:?}", outcome),
        // Already shown by the workspace; the loaded set is unchanged.
        Err(e) => crate::debug!("sleep"; "sync failed: {}", e),
    }
}

impl SleepHandle {
    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    /// Record an opened file; schedules a sync when its module is not loaded.
    pub fn file_opened(&self, file: &Path) {
        if self
            .workspace
            .on_file_opened(file, std::time::Instant::now())
        {
            let _ = self.tx.send(SleepMsg::Schedule);
        }
    }

    pub fn file_closed(&self, file: &Path) {
        self.workspace.on_file_closed(file);
    }

    pub fn sync_now(&self) {
        let _ = self.tx.send(SleepMsg::SyncNow);
    }

    /// Restore through the actor, so it serializes with pending syncs.
    pub async fn restore_all(&self) -> Result<RestoreOutcome, ManifestError> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(SleepMsg::RestoreAll(reply)).is_err() {
            return self.workspace.restore_all();
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => self.workspace.restore_all(),
        }
    }

    /// Stop the actor and clear all workspace maps.
    ///
    /// An in-flight sync is allowed to finish; its result is discarded.
    pub async fn dispose(&self) {
        self.workspace.dispose();
        let _ = self.tx.send(SleepMsg::Shutdown);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, task).await;
        }
    }
}
