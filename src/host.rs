//! Host environment collaborators.
//!
//! The host is whatever owns the build graph: it is asked to resync after
//! the manifest changes and receives human-readable summaries.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::log;

/// Reload signal and notification sink.
pub trait Host: Send + Sync {
    /// Ask the host to resynchronize its build graph from the manifest.
    fn reload(&self, reason: &str);

    /// Human-readable summary. Not required for correctness.
    fn notify(&self, title: &str, body: &str);
}

/// Host for the CLI: logs to the terminal and optionally runs a command.
pub struct TerminalHost {
    root: PathBuf,
    reload_command: Option<String>,
}

impl TerminalHost {
    pub fn new(root: PathBuf, reload_command: Option<String>) -> Self {
        Self {
            root,
            reload_command,
        }
    }

    /// Spawn the reload command without blocking the sync path.
    fn spawn_reload(&self, command: &str) {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };
        cmd.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        match cmd.spawn() {
            Ok(child) => {
                let command = command.to_string();
                std::thread::spawn(move || match child.wait_with_output() {
                    Ok(output) if output.status.success() => {
                        crate::debug!("reload"; "`{}` finished", command);
                    }
                    Ok(output) => {
                        let stderr = String::from_utf8_lossy(&output.stderr);
                        log!("reload"; "`{}` failed ({}): {}", command, output.status, stderr.trim());
                    }
                    Err(e) => log!("reload"; "`{}` failed: {}", command, e),
                });
            }
            Err(e) => log!("reload"; "cannot run `{}`: {}", command, e),
        }
    }
}

impl Host for TerminalHost {
    fn reload(&self, reason: &str) {
        crate::debug!("reload"; "{}", reason);
        if let Some(command) = &self.reload_command {
            self.spawn_reload(command);
        }
    }

    fn notify(&self, title: &str, body: &str) {
        crate::logger::status_success(&format!("{title}: {body}"));
    }
}
