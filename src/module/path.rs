//! Hierarchical module identifiers.
//!
//! ```text
//! :              ← root sentinel (always loaded, never written to the manifest)
//! :lib           ← top-level module
//! :lib:foo-bar   ← nested module
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Serialize, Serializer};

/// Segment delimiter for module paths.
pub const DELIMITER: char = ':';

/// A module path such as `:lib:foo`.
///
/// Always starts with the delimiter; the bare delimiter is the root module.
/// Ordering is lexical on the full string, which keeps generated manifest
/// blocks stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(String);

impl ModulePath {
    /// The root sentinel `:`.
    pub fn root() -> Self {
        Self(DELIMITER.to_string())
    }

    /// Parse a module path, normalizing the leading delimiter.
    ///
    /// Returns `None` for empty segments (`:a::b`) or whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return None;
        }
        let body = raw.strip_prefix(DELIMITER).unwrap_or(raw);
        if body.is_empty() {
            return Some(Self::root());
        }
        if body.split(DELIMITER).any(str::is_empty) {
            return None;
        }
        Some(Self(format!("{DELIMITER}{body}")))
    }

    /// Build a path from its segments. No segments yields the root.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            path.push(DELIMITER);
            path.push_str(segment.as_ref());
        }
        if path.is_empty() {
            Self::root()
        } else {
            Self(path)
        }
    }

    /// Derive a module path from a directory relative to the project root.
    ///
    /// `lib/foo` → `:lib:foo`. Returns `None` for paths that escape the root.
    pub fn from_relative_dir(rel: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(Self::from_segments(segments))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Iterate over segments (`:lib:foo` → `lib`, `foo`). Empty for root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0[1..].split(DELIMITER).filter(|s| !s.is_empty())
    }

    /// Last segment, i.e. the folder name. Empty for root.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// Parent module path. Root has no parent.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(DELIMITER) {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Directory of this module under `root` using the conventional layout.
    pub fn to_dir(&self, root: &Path) -> PathBuf {
        self.segments().fold(root.to_path_buf(), |dir, seg| dir.join(seg))
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ModulePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
