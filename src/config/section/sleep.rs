//! `[sleep]` section configuration.
//!
//! Controls when modules are put to sleep.
//!
//! # Example
//!
//! ```toml
//! [sleep]
//! idle_timeout_minutes = 30       # Release modules untouched this long
//! # auto_sleep = true             # Unset: enable only for large projects
//! large_project_threshold = 100   # Module count that enables auto sleep
//! pinned = ["app", "core"]        # Folder names never released
//! debounce_ms = 2000              # Quiet period before a manifest write
//! sweep_interval_secs = 30        # Idle sweep period
//! restore_on_exit = true          # Restore the manifest when `watch` stops
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Infra/tooling folder-name suffixes excluded from the manifest by default.
pub const DEFAULT_INFRA_SUFFIXES: &[&str] = &[
    "build-logic",
    "buildSrc",
    "-convention",
    "-conventions",
    "-plugin",
    "-plugins",
    "-bom",
    "-platform",
];

/// Module sleep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Minutes without activity before a module may be released.
    pub idle_timeout_minutes: u64,

    /// Explicit override. `None` decides by module count.
    pub auto_sleep: Option<bool>,

    /// Module count above which auto sleep turns itself on.
    pub large_project_threshold: usize,

    /// Folder names pinned by the user; never released.
    pub pinned: Vec<String>,

    /// Folder-name suffixes of infra/tooling modules.
    pub infra_suffixes: Vec<String>,

    /// Quiet period before a sync runs, in milliseconds.
    pub debounce_ms: u64,

    /// Idle sweep period, in seconds.
    pub sweep_interval_secs: u64,

    /// Restore the manifest when the watcher stops.
    pub restore_on_exit: bool,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 30,
            auto_sleep: None,
            large_project_threshold: 100,
            pinned: Vec::new(),
            infra_suffixes: DEFAULT_INFRA_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            debounce_ms: 2000,
            sweep_interval_secs: 30,
            restore_on_exit: true,
        }
    }
}

impl SleepConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes * 60)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.idle_timeout_minutes == 0 {
            diag.error_with_hint(
                FieldPath::new("sleep.idle_timeout_minutes"),
                "must be greater than 0",
                "use `auto_sleep = false` to disable releasing modules",
            );
        }
        if self.sweep_interval_secs == 0 {
            diag.error(FieldPath::new("sleep.sweep_interval_secs"), "must be greater than 0");
        }
        if self.pinned.iter().any(|name| name.contains(['/', '\\', ':'])) {
            diag.error_with_hint(
                FieldPath::new("sleep.pinned"),
                "entries must be plain folder names",
                "write `core`, not `lib/core` or `:lib:core`",
            );
        }
    }
}
