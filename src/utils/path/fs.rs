//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_path` - resolve relative paths with fallback directory

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
///
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a path that may be relative to cwd or a fallback directory.
///
/// Always returns an absolute path.
///
/// Tries in order:
/// 1. If absolute, use as-is
/// 2. If exists relative to cwd, normalize to absolute
/// 3. Otherwise, resolve relative to fallback_dir
///
/// `lib/foo/Foo.kt` typed from the project root and from a subdirectory
/// both land on the same file.
#[inline]
pub fn resolve_path(path: &Path, fallback_dir: &Path) -> PathBuf {
    // Absolute path: use as-is
    if path.is_absolute() {
        return path.to_path_buf();
    }

    // Try cwd-relative first
    if path.exists() {
        return normalize_path(path);
    }

    // Fall back to fallback_dir-relative
    normalize_path(&fallback_dir.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("lib/foo/build.gradle.kts"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("lib/foo/build.gradle.kts"));
    }

    #[test]
    fn test_normalize_path_resolves_dots() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("lib/foo")).unwrap();
        let dotted = temp.path().join("lib/./foo/../foo");
        assert_eq!(normalize_path(&dotted), normalize_path(&temp.path().join("lib/foo")));
    }

    #[test]
    fn test_resolve_path_absolute() {
        let resolved = resolve_path(Path::new("/repo/lib/foo"), Path::new("/fallback"));
        assert_eq!(resolved, PathBuf::from("/repo/lib/foo"));
    }

    #[test]
    fn test_resolve_path_fallback() {
        // Missing relative to cwd: joined onto the project root
        let resolved = resolve_path(Path::new("zz-missing/Foo.kt"), Path::new("/repo"));
        assert_eq!(resolved, PathBuf::from("/repo/zz-missing/Foo.kt"));
    }
}
