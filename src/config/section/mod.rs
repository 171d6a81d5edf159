//! Configuration section definitions.
//!
//! Each module corresponds to a section in `dormant.toml`:
//!
//! | Module    | TOML Section | Purpose                                |
//! |-----------|--------------|----------------------------------------|
//! | `project` | `[project]`  | Manifest, markers, ignore list, reload |
//! | `sleep`   | `[sleep]`    | Idle timeout, pinning, scheduling      |

mod project;
mod sleep;

pub use project::ProjectConfig;
pub use sleep::{DEFAULT_INFRA_SUFFIXES, SleepConfig};
