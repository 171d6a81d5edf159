//! Actor System for Module Sleep
//!
//! Message-passing driver around a [`Workspace`](crate::workspace::Workspace):
//!
//! ```text
//! FileWatcher ─┐
//!              ├─▶ SleepHandle ──msg──▶ SleepService ──▶ Workspace::sync
//! stdin ───────┘                        (debounce, sweep)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types
//! - `debouncer` - Pure timing
//! - `service` - The actor and its handle
//! - `source` - File watcher and stdin event sources

mod debouncer;
pub mod messages;
mod service;
pub mod source;


pub use service::{SleepHandle, SleepService};
