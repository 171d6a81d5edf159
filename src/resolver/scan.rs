//! Tolerant scanner for module declaration text.
//!
//! Not a parser: comment lines are dropped, then two reference shapes are
//! matched line by line.
//!
//! | Shape    | Example                          |
//! |----------|----------------------------------|
//! | literal  | `project(":lib:foo")`            |
//! | literal  | `project(path = ":lib:foo")`     |
//! | accessor | `projects.lib.fooBar`            |

use std::sync::LazyLock;

use regex::Regex;

/// Single-line comment prefix.
pub const COMMENT_PREFIX: &str = "//";

static RE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"project[ \t]*\([ \t]*(?:path[ \t]*=[ \t]*)?["'](:[^"' \t]*)["']"#).unwrap()
});

static RE_ACCESSOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_.])projects((?:\.[A-Za-z_][A-Za-z0-9_]*)+)").unwrap()
});

/// A dependency reference as written in the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Explicit hierarchical path, e.g. `:lib:foo`
    Literal(String),
    /// Dotted accessor segments, e.g. `["lib", "fooBar"]`
    Accessor(Vec<String>),
}

impl Reference {
    /// Source spelling for diagnostics.
    pub fn spelling(&self) -> String {
        match self {
            Self::Literal(path) => format!("project(\"{path}\")"),
            Self::Accessor(segments) => format!("projects.{}", segments.join(".")),
        }
    }
}

/// Drop whole-line comments so disabled dependencies are not matched.
pub fn strip_comments(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .filter(|line| !line.trim_start().starts_with(COMMENT_PREFIX))
}

/// Extract all references in source order, deduplicated.
pub fn scan_references(text: &str) -> Vec<Reference> {
    let mut refs = Vec::new();
    for line in strip_comments(text) {
        for caps in RE_LITERAL.captures_iter(line) {
            push_unique(&mut refs, Reference::Literal(caps[1].to_string()));
        }
        for caps in RE_ACCESSOR.captures_iter(line) {
            let segments = caps[1]
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            push_unique(&mut refs, Reference::Accessor(segments));
        }
    }
    refs
}

fn push_unique(refs: &mut Vec<Reference>, reference: Reference) {
    if !refs.contains(&reference) {
        refs.push(reference);
    }
}
