//! Actor Message Definitions
//!
//! ```text
//! SleepHandle --Schedule/SyncNow/RestoreAll/Shutdown--> SleepService
//! ```

use tokio::sync::oneshot;

use crate::manifest::{ManifestError, RestoreOutcome};

/// Messages to the sleep service
#[derive(Debug)]
pub enum SleepMsg {
    /// A module was requested; (re)arm the debounce timer
    Schedule,
    /// Sync immediately, dropping any pending debounce
    SyncNow,
    /// Restore the manifest and reply with the outcome
    RestoreAll(oneshot::Sender<Result<RestoreOutcome, ManifestError>>),
    /// Shutdown
    Shutdown,
}
