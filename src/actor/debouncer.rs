use std::time::Duration;

use tokio::time::Instant;

/// Sleep used when nothing is armed.
const IDLE: Duration = Duration::from_secs(86400);

/// Pure debouncer: only handles timing.
/// No business logic, no global state access.
///
/// Every event re-arms a single deadline; only the last event of a burst
/// decides when the sync runs.
pub(super) struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Cancel any pending deadline and start a new quiet period.
    pub(super) fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub(super) fn cancel(&mut self) {
        self.deadline = None;
    }

    pub(super) fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub(super) fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Disarm and return `true` if the quiet period has elapsed.
    pub(super) fn take_if_due(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.deadline = None;
        true
    }

    /// Precise sleep duration until the deadline.
    pub(super) fn sleep_duration(&self, now: Instant) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(now)
                .max(Duration::from_millis(1)),
            None => IDLE,
        }
    }
}
