//! `dormant deps`: print the transitive dependency closure of a module.

use anyhow::Result;
use serde::Serialize;

use super::common::{open_workspace, resolve_target};
use crate::config::WorkspaceConfig;
use crate::module::ModulePath;
use crate::resolver::UnresolvedDependency;

#[derive(Serialize)]
struct DepsReport {
    module: ModulePath,
    closure: Vec<ModulePath>,
    unresolved: Vec<UnresolvedDependency>,
}

pub fn run_deps(config: WorkspaceConfig, target: &str, json: bool) -> Result<()> {
    let workspace = open_workspace(config);
    let module = resolve_target(&workspace, target)?;
    let closure = workspace
        .resolver()
        .expand_transitively([module.clone()]);

    let report = DepsReport {
        module,
        closure: closure.modules.into_iter().collect(),
        unresolved: closure.unresolved,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

fn print_text(report: &DepsReport) {
    for module in &report.closure {
        let mark = if *module == report.module { "*" } else { " " };
        println!("{} {}", mark, module);
    }
    for dep in &report.unresolved {
        println!("? {} -> {} ({})", dep.from, dep.reference, dep.reason);
    }
}
