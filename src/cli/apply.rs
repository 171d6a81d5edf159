//! `dormant apply`: include modules (and their dependencies) immediately.

use std::time::Instant;

use anyhow::Result;

use super::common::{open_workspace, resolve_target};
use crate::config::WorkspaceConfig;
use crate::log;
use crate::manifest::ApplyOutcome;
use crate::workspace::SyncOutcome;

pub fn run_apply(config: WorkspaceConfig, targets: &[String]) -> Result<()> {
    let workspace = open_workspace(config);
    let modules = targets
        .iter()
        .map(|target| resolve_target(&workspace, target))
        .collect::<Result<Vec<_>>>()?;

    match workspace.apply_now(&modules, Instant::now())? {
        SyncOutcome::Applied(ApplyOutcome::Unchanged) => {
            log!("manifest"; "already up to date");
        }
        SyncOutcome::Applied(ApplyOutcome::Block { included }) => {
            log!("manifest"; "included {} of {} modules", included, workspace.module_count());
        }
        SyncOutcome::Applied(ApplyOutcome::Lines { slept, woken }) => {
            log!("manifest"; "slept {}, woke {} include lines", slept, woken);
        }
        SyncOutcome::Empty => {
            log!("warning"; "only root and infra modules selected, manifest left alone");
        }
        SyncOutcome::Disabled | SyncOutcome::Inactive => {
            log!("warning"; "manifest is managed by another tool, nothing written");
        }
    }
    Ok(())
}
