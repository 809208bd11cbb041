//! Timing knobs for a client session.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long a form's success signal stays visible after a save.
    pub success_window: Duration,
    /// How long an informational or error notice stays up.
    pub notice_window: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            success_window: Duration::from_secs(3),
            notice_window: Duration::from_secs(6),
        }
    }
}
