//! `dormant status`: discovered modules and manifest state.

use std::time::Instant;

use anyhow::Result;

use super::common::open_workspace;
use crate::config::WorkspaceConfig;
use crate::workspace::WorkspaceStatus;

pub fn run_status(config: WorkspaceConfig, json: bool, pretty: bool) -> Result<()> {
    let workspace = open_workspace(config);
    let status = workspace.status(Instant::now());

    if json {
        let formatted = if pretty {
            serde_json::to_string_pretty(&status)?
        } else {
            serde_json::to_string(&status)?
        };
        println!("{}", formatted);
    } else {
        print_text(&status);
    }
    Ok(())
}

fn print_text(status: &WorkspaceStatus) {
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("root        {}", status.root.display());
    println!("manifest    {}", status.manifest.display());
    println!("modules     {}", status.modules);
    println!("auto sleep  {}", yes_no(status.auto_sleep_active));
    println!("managed     {}", yes_no(status.managed));
    println!("open files  {} ({} pending)", status.open_files, status.pending);
    if let Some(ref generated) = status.last_generated {
        println!("generated   {}", generated);
    }
    if status.disabled {
        println!("disabled    conflicting manager detected");
    }
    if !status.protected.is_empty() {
        println!("protected:");
        for module in &status.protected {
            println!("  {}", module);
        }
    }
}
