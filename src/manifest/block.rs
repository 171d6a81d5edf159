//! The managed block: a sentinel-delimited span of generated includes.

use super::line::split_eol;
use crate::module::ModulePath;

pub const BLOCK_BEGIN: &str = "// >>> dormant: managed modules (generated, do not edit) >>>";
pub const BLOCK_END: &str = "// <<< dormant: managed modules <<<";
const GENERATED_PREFIX: &str = "// generated: ";
const SUMMARY_PREFIX: &str = "// summary: ";

/// Inclusive line range of the block, sentinels included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub begin: usize,
    pub end: usize,
}

/// Outcome of looking for the block.
#[derive(Debug, PartialEq, Eq)]
pub enum Located {
    Found(BlockSpan),
    Absent,
    /// Begin sentinel without end sentinel, at this line
    Unterminated(usize),
}

/// Find the managed block by its sentinels.
pub fn locate(lines: &[&str]) -> Located {
    let is = |line: &str, sentinel: &str| split_eol(line).0.trim() == sentinel;

    let Some(begin) = lines.iter().position(|l| is(l, BLOCK_BEGIN)) else {
        return Located::Absent;
    };
    match lines[begin + 1..].iter().position(|l| is(l, BLOCK_END)) {
        Some(offset) => Located::Found(BlockSpan {
            begin,
            end: begin + 1 + offset,
        }),
        None => Located::Unterminated(begin),
    }
}

/// Render the block for `includes` (already filtered and sorted).
pub fn render(includes: &[&ModulePath], sleeping: usize, generated: &str, eol: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(includes.len() + 4);
    out.push(format!("{BLOCK_BEGIN}{eol}"));
    out.push(format!("{GENERATED_PREFIX}{generated}{eol}"));
    out.push(format!(
        "{SUMMARY_PREFIX}{} included, {} sleeping{eol}",
        includes.len(),
        sleeping
    ));
    for path in includes {
        out.push(format!("include(\"{path}\"){eol}"));
    }
    out.push(format!("{BLOCK_END}{eol}"));
    out
}

/// Compare block contents, ignoring the generation timestamp.
pub fn same_content<A: AsRef<str>, B: AsRef<str>>(existing: &[A], rendered: &[B]) -> bool {
    let strip = |line: &str| {
        let body = split_eol(line).0;
        (!body.starts_with(GENERATED_PREFIX)).then(|| body.to_string())
    };
    let a: Vec<_> = existing.iter().filter_map(|l| strip(l.as_ref())).collect();
    let b: Vec<_> = rendered.iter().filter_map(|l| strip(l.as_ref())).collect();
    a == b
}

/// Timestamp recorded on the block's `generated:` line.
pub fn generated<'a>(block: &[&'a str]) -> Option<&'a str> {
    block
        .iter()
        .find_map(|l| split_eol(l).0.strip_prefix(GENERATED_PREFIX))
}
