//! Line-level handling of inclusion statements.
//!
//! Lines are kept with their terminator so untouched lines round-trip
//! byte-for-byte, including `\r\n` endings.

use std::sync::LazyLock;

use regex::Regex;

use crate::module::ModulePath;

/// Trailing marker on include lines slept by the rewriter.
pub const SLEEP_MARKER: &str = " // dormant:sleeping";

const COMMENT: &str = "// ";

static RE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*include[ \t]*\(([^)]*)\)").unwrap());

static RE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Split a line into body and terminator.
pub fn split_eol(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Leading whitespace of a line body.
fn indent(body: &str) -> &str {
    let rest = body.trim_start_matches([' ', '\t']);
    &body[..body.len() - rest.len()]
}

/// Module paths named by an active `include(...)` statement.
///
/// Returns `None` when the line is not an inclusion statement.
pub fn include_args(body: &str) -> Option<Vec<ModulePath>> {
    let caps = RE_INCLUDE.captures(body)?;
    let args = RE_QUOTED
        .captures_iter(&caps[1])
        .filter_map(|c| ModulePath::parse(&c[1]))
        .collect();
    Some(args)
}

/// Whether a line body was slept by the rewriter.
pub fn is_sleeping(body: &str) -> bool {
    wake_body(body).is_some()
}

/// Comment out an include line, appending the sleep marker.
pub fn sleep_line(line: &str) -> String {
    let (body, eol) = split_eol(line);
    let indent = indent(body);
    format!("{indent}{COMMENT}{}{SLEEP_MARKER}{eol}", &body[indent.len()..])
}

/// The original body of a slept line, if it is one.
pub fn wake_body(body: &str) -> Option<String> {
    let inner = body.strip_suffix(SLEEP_MARKER)?;
    let indent = indent(inner);
    let original = inner[indent.len()..].strip_prefix(COMMENT)?;
    Some(format!("{indent}{original}"))
}

/// Restore a slept line including its terminator.
pub fn wake_line(line: &str) -> Option<String> {
    let (body, eol) = split_eol(line);
    wake_body(body).map(|body| format!("{body}{eol}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_eol() {
        assert_eq!(split_eol("a\r\n"), ("a", "\r\n"));
        assert_eq!(split_eol("a\n"), ("a", "\n"));
        assert_eq!(split_eol("a"), ("a", ""));
    }

    #[test]
    fn test_include_args() {
        let args = include_args("include(\":lib:a\")").unwrap();
        assert_eq!(args, vec![ModulePath::parse(":lib:a").unwrap()]);

        let args = include_args("  include(\":a\", \":b\")").unwrap();
        assert_eq!(args.len(), 2);

        assert!(include_args("includeBuild(\"build-logic\")").is_none());
        assert!(include_args("// include(\":a\")").is_none());
        assert!(include_args("rootProject.name = \"x\"").is_none());
    }

    #[test]
    fn test_sleep_and_wake_round_trip() {
        let line = "    include(\":lib:c\")\r\n";
        let slept = sleep_line(line);
        assert_eq!(slept, "    // include(\":lib:c\") // dormant:sleeping\r\n");
        assert!(is_sleeping(split_eol(&slept).0));
        assert!(include_args(split_eol(&slept).0).is_none());
        assert_eq!(wake_line(&slept).unwrap(), line);
    }

    #[test]
    fn test_user_comment_is_not_sleeping() {
        assert!(!is_sleeping("// include(\":x\")"));
        assert!(!is_sleeping("include(\":x\") // dormant:sleeping"));
    }
}
