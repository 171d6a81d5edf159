//! `[project]` section configuration.
//!
//! Describes the build tool conventions of the tree.
//!
//! # Example
//!
//! ```toml
//! [project]
//! manifest = "settings.gradle.kts"
//! markers = ["build.gradle.kts", "build.gradle"]
//! ignore = ["build", "out", "node_modules"]
//! conflict_markers = ["com.dropbox.focus"]
//! reload_command = "./gradlew --offline help"
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Project layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Manifest file name, relative to the project root.
    pub manifest: String,

    /// Declaration marker file names, in precedence order.
    pub markers: Vec<String>,

    /// Directory names never scanned for modules.
    pub ignore: Vec<String>,

    /// Manifest substrings showing another tool manages module inclusion.
    pub conflict_markers: Vec<String>,

    /// Command run in the project root after each manifest write.
    pub reload_command: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest: "settings.gradle.kts".into(),
            markers: vec!["build.gradle.kts".into(), "build.gradle".into()],
            ignore: ["build", "out", "target", "node_modules", "gradle"]
                .map(String::from)
                .to_vec(),
            conflict_markers: ["com.dropbox.focus", "focus.gradle", "// >>> focus"]
                .map(String::from)
                .to_vec(),
            reload_command: None,
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.manifest.trim().is_empty() || self.manifest.contains(['/', '\\']) {
            diag.error_with_hint(
                FieldPath::new("project.manifest"),
                "must be a file name in the project root",
                "e.g. `settings.gradle.kts`",
            );
        }
        if self.markers.iter().all(|m| m.trim().is_empty()) {
            diag.error(FieldPath::new("project.markers"), "at least one marker file name is required");
        }
        if self.reload_command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            diag.warn(FieldPath::new("project.reload_command"), "empty command is ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_project_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.project.manifest, "settings.gradle.kts");
        assert_eq!(config.project.markers[0], "build.gradle.kts");
        assert!(config.project.reload_command.is_none());
    }

    #[test]
    fn test_project_validation() {
        let config = test_parse_config("[project]\nmanifest = \"gradle/settings.gradle.kts\"\nmarkers = []");
        let mut diag = ConfigDiagnostics::new();
        config.project.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
