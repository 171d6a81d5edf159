//! Command-line interface module.

mod args;
pub mod apply;
pub mod common;
pub mod deps;
pub mod restore;
pub mod status;
pub mod watch;

pub use args::{Cli, Commands};
