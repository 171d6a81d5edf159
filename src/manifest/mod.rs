//! Manifest rewriting.
//!
//! Two strategies, chosen per file:
//!
//! - **Block**: a sentinel-delimited block of generated `include(...)` lines
//!   is replaced wholesale. Used when the block exists, or appended when the
//!   manifest has no include statements at all (auto-discovery style).
//! - **Sleep**: hand-written include lines for inactive modules are commented
//!   out with a trailing marker and woken again when they become active.
//!
//! Everything else in the file is preserved byte-for-byte. `restore()` undoes
//! both strategies and is safe to call at any time.

mod block;
mod line;


use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::host::Host;
use crate::module::{InfraMatcher, ModulePath};
use crate::utils::date::DateTimeUtc;

pub use block::{BLOCK_BEGIN, BLOCK_END};
pub use line::SLEEP_MARKER;

use block::{BlockSpan, Located};

/// Manifest rewrite errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error on manifest `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("no modules to include and no managed state to release")]
    EmptyActiveSet,

    #[error("managed block in `{0}` starts at line {1} but never ends")]
    UnterminatedBlock(PathBuf, usize),
}

/// What `apply()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// File already reflected the active set; nothing written
    Unchanged,
    /// Managed block replaced or appended
    Block { included: usize },
    /// Hand-written include lines slept or woken
    Lines { slept: usize, woken: usize },
}

impl ApplyOutcome {
    pub fn wrote(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// What `restore()` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub block_removed: bool,
    pub lines_woken: usize,
}

impl RestoreOutcome {
    pub fn wrote(self) -> bool {
        self.block_removed || self.lines_woken > 0
    }
}

/// Applies and restores the managed state of one manifest file.
pub struct ManifestRewriter {
    path: PathBuf,
    infra: InfraMatcher,
    host: Arc<dyn Host>,
}

impl ManifestRewriter {
    pub fn new(path: PathBuf, infra: InfraMatcher, host: Arc<dyn Host>) -> Self {
        Self { path, infra, host }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the manifest so exactly `active` modules are included.
    ///
    /// `known` is the number of discovered modules, used for the summary line.
    /// Root and infra modules are never written. On error the file is left
    /// untouched.
    ///
    /// With nothing to include, a manifest that already carries managed state
    /// is released down to root and infra modules (an empty block, or every
    /// include slept). An unmanaged manifest is rejected with
    /// [`ManifestError::EmptyActiveSet`].
    pub fn apply(&self, active: &BTreeSet<ModulePath>, known: usize) -> Result<ApplyOutcome, ManifestError> {
        let includes: Vec<&ModulePath> = active
            .iter()
            .filter(|p| !p.is_root() && !self.infra.is_infra(p))
            .collect();

        let content = self.read()?;
        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let eol = detect_eol(&lines);
        let located = block::locate(&lines);

        if includes.is_empty() && located == Located::Absent && !has_sleeping(&lines) {
            return Err(ManifestError::EmptyActiveSet);
        }

        let (next, outcome) = match located {
            Located::Found(span) => {
                let sleeping = known.saturating_sub(includes.len());
                let rendered = block::render(&includes, sleeping, &generated_at(), eol);
                if block::same_content(&lines[span.begin..=span.end], &rendered) {
                    return Ok(ApplyOutcome::Unchanged);
                }
                let next = splice(&lines, span, &rendered);
                (next, ApplyOutcome::Block { included: includes.len() })
            }
            Located::Unterminated(at) => {
                return Err(ManifestError::UnterminatedBlock(self.path.clone(), at + 1));
            }
            Located::Absent => match self.sleep_lines(&lines, active) {
                Some((next, slept, woken)) if slept + woken > 0 => {
                    (next, ApplyOutcome::Lines { slept, woken })
                }
                Some(_) => return Ok(ApplyOutcome::Unchanged),
                None => {
                    let sleeping = known.saturating_sub(includes.len());
                    let rendered = block::render(&includes, sleeping, &generated_at(), eol);
                    (append_block(&content, &rendered, eol), ApplyOutcome::Block { included: includes.len() })
                }
            },
        };

        self.write(&next)?;
        self.host.reload("manifest updated");
        Ok(outcome)
    }

    /// Sleep inactive include lines and wake active ones.
    ///
    /// Returns `None` when the manifest has no include statements at all.
    fn sleep_lines(&self, lines: &[&str], active: &BTreeSet<ModulePath>) -> Option<(String, usize, usize)> {
        let keep = |args: &[ModulePath]| {
            args.is_empty() || args.iter().any(|p| p.is_root() || active.contains(p) || self.infra.is_infra(p))
        };

        let mut any_include = false;
        let (mut slept, mut woken) = (0, 0);
        let mut out = String::new();

        for &raw in lines {
            let (body, _) = line::split_eol(raw);
            if let Some(original) = line::wake_body(body) {
                any_include = true;
                let args = line::include_args(&original).unwrap_or_default();
                if keep(args.as_slice()) {
                    out.push_str(&line::wake_line(raw).unwrap_or_else(|| raw.to_string()));
                    woken += 1;
                    continue;
                }
            } else if let Some(args) = line::include_args(body) {
                any_include = true;
                if !keep(args.as_slice()) {
                    out.push_str(&line::sleep_line(raw));
                    slept += 1;
                    continue;
                }
            }
            out.push_str(raw);
        }

        any_include.then_some((out, slept, woken))
    }

    /// Remove the managed block and wake all slept lines.
    ///
    /// A missing manifest or one without managed state is a no-op.
    pub fn restore(&self) -> Result<RestoreOutcome, ManifestError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RestoreOutcome::default()),
            Err(e) => return Err(ManifestError::Io(self.path.clone(), e)),
        };
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        let mut outcome = RestoreOutcome::default();
        let mut skip = None;
        // Line whose terminator was added when the block was appended
        let mut unterminate = None;
        if let Located::Found(span) = block::locate(&lines) {
            let at_eof = span.end + 1 == lines.len();
            let begin = match span.begin.checked_sub(1) {
                Some(prev) if line::split_eol(lines[prev]).0.trim().is_empty() => prev,
                Some(prev) if at_eof => {
                    unterminate = Some(prev);
                    span.begin
                }
                _ => span.begin,
            };
            skip = Some(begin..=span.end);
            outcome.block_removed = true;
        }

        let mut out = String::with_capacity(content.len());
        for (i, &raw) in lines.iter().enumerate() {
            if skip.as_ref().is_some_and(|r| r.contains(&i)) {
                continue;
            }
            let raw = if unterminate == Some(i) {
                line::split_eol(raw).0
            } else {
                raw
            };
            match line::wake_line(raw) {
                Some(woken) => {
                    out.push_str(&woken);
                    outcome.lines_woken += 1;
                }
                None => out.push_str(raw),
            }
        }

        if outcome.wrote() {
            self.write(&out)?;
            self.host.reload("manifest restored");
        }
        Ok(outcome)
    }

    /// Whether the manifest currently carries managed state.
    pub fn is_managed(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|content| {
            let lines: Vec<&str> = content.split_inclusive('\n').collect();
            block::locate(&lines) != Located::Absent || has_sleeping(&lines)
        })
    }

    /// When the managed block was last generated.
    pub fn last_generated(&self) -> Option<DateTimeUtc> {
        let content = fs::read_to_string(&self.path).ok()?;
        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        match block::locate(&lines) {
            Located::Found(span) => DateTimeUtc::parse(block::generated(&lines[span.begin..=span.end])?),
            _ => None,
        }
    }

    /// First of `needles` found in the manifest, if any.
    pub fn find_marker<'a>(&self, needles: &'a [String]) -> Option<&'a str> {
        let content = fs::read_to_string(&self.path).ok()?;
        needles
            .iter()
            .map(String::as_str)
            .find(|needle| !needle.is_empty() && content.contains(needle))
    }

    fn read(&self) -> Result<String, ManifestError> {
        fs::read_to_string(&self.path).map_err(|e| ManifestError::Io(self.path.clone(), e))
    }

    /// Write via a sibling temp file and rename, so a failed write never
    /// leaves a truncated manifest behind.
    fn write(&self, content: &str) -> Result<(), ManifestError> {
        let io_err = |e| ManifestError::Io(self.path.clone(), e);
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self.path.with_file_name(format!(".{name}.dormant-tmp"));

        fs::write(&tmp, content).map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(e));
        }
        crate::debug!("manifest"; "wrote {}", self.path.display());
        Ok(())
    }
}

fn detect_eol(lines: &[&str]) -> &'static str {
    if lines.iter().any(|l| l.ends_with("\r\n")) {
        "\r\n"
    } else {
        "\n"
    }
}

fn has_sleeping(lines: &[&str]) -> bool {
    lines.iter().any(|l| line::is_sleeping(line::split_eol(l).0))
}

fn generated_at() -> String {
    DateTimeUtc::now().to_rfc3339()
}

fn splice(lines: &[&str], span: BlockSpan, rendered: &[String]) -> String {
    let mut out = String::new();
    lines[..span.begin].iter().for_each(|l| out.push_str(l));
    rendered.iter().for_each(|l| out.push_str(l));
    lines[span.end + 1..].iter().for_each(|l| out.push_str(l));
    out
}

/// Append the block at end of file.
///
/// One terminator is added: after a complete last line it forms a blank
/// separator, after an unterminated one it ends that line. `restore` undoes
/// either case.
fn append_block(content: &str, rendered: &[String], eol: &str) -> String {
    let mut out = String::with_capacity(content.len() + rendered.iter().map(String::len).sum::<usize>() + 2);
    out.push_str(content);
    out.push_str(eol);
    rendered.iter().for_each(|l| out.push_str(l));
    out
}
