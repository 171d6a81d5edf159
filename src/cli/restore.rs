//! `dormant restore`: remove every trace of managed state.

use anyhow::Result;

use super::common::open_workspace;
use crate::config::WorkspaceConfig;
use crate::log;

pub fn run_restore(config: WorkspaceConfig) -> Result<()> {
    let workspace = open_workspace(config);
    let outcome = workspace.restore_all()?;

    if !outcome.wrote() {
        log!("manifest"; "nothing to restore");
        return Ok(());
    }
    if outcome.block_removed {
        log!("manifest"; "removed managed block");
    }
    if outcome.lines_woken > 0 {
        log!("manifest"; "woke {} include lines", outcome.lines_woken);
    }
    Ok(())
}
