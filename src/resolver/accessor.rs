//! Symbolic accessor resolution.
//!
//! `projects.lib.fooBar` is reconstructed as `:lib:foo-bar`. When that
//! directory is not a module, sibling directories of the expected parent are
//! searched for a single name sharing the first dash segment (`foo`). Zero or
//! several candidates leave the reference unresolved.

use std::fs;

use super::UnresolveReason;
use crate::module::{Layout, ModulePath};

/// Convert one accessor segment from camelCase to kebab-case.
///
/// `fooBar` → `foo-bar`, `http2Client` → `http2-client`, `Core` → `core`.
pub fn kebab_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, ch) in segment.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Reconstruct the expected module path from accessor segments.
pub fn expected_path(segments: &[String]) -> ModulePath {
    ModulePath::from_segments(segments.iter().map(|s| kebab_case(s)))
}

/// Resolve accessor segments to an existing module.
pub fn resolve(layout: &Layout, segments: &[String]) -> Result<ModulePath, UnresolveReason> {
    let expected = expected_path(segments);
    if expected.is_root() {
        return Err(UnresolveReason::Missing);
    }
    if layout.describe_path(&expected).is_some() {
        return Ok(expected);
    }
    fuzzy_match(layout, &expected)
}

/// Bounded fuzzy match among siblings of the expected parent.
fn fuzzy_match(layout: &Layout, expected: &ModulePath) -> Result<ModulePath, UnresolveReason> {
    let parent = expected.parent().unwrap_or_else(ModulePath::root);
    let parent_dir = parent.to_dir(&layout.root);
    let leaf = expected.name();
    let prefix = leaf.split('-').next().unwrap_or(leaf);
    if prefix.is_empty() {
        return Err(UnresolveReason::Missing);
    }

    let Ok(entries) = fs::read_dir(&parent_dir) else {
        return Err(UnresolveReason::Missing);
    };

    let mut candidates: Vec<ModulePath> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| !layout.is_ignored(name) && name.to_ascii_lowercase().starts_with(prefix))
        })
        .filter_map(|entry| layout.describe(&entry.path()))
        .map(|desc| desc.path)
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(UnresolveReason::Missing),
        1 => Ok(candidates.remove(0)),
        _ => Err(UnresolveReason::Ambiguous(candidates)),
    }
}
