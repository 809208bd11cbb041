//! Records session events so engine behaviour can be inspected while prototyping.

#[cfg(feature = "telemetry")]
use std::collections::VecDeque;

#[cfg(feature = "telemetry")]
use parking_lot::Mutex;

/// Oldest events are dropped once this many are held.
pub const MAX_EVENTS: usize = 256;

#[derive(Debug, Clone)]
pub enum Event {
    SessionStarted(String),
    FilterChanged(Option<String>),
    FetchRequested(u64),
    FetchApplied { token: u64, count: usize },
    FetchDiscarded { token: u64, latest: u64 },
    FetchFailed { token: u64, error: String },
    SubmitStarted(&'static str),
    MutationApplied(String),
    MutationFailed { action: String, error: String },
    SessionEnded,
}

pub struct Handle {
    #[cfg(feature = "telemetry")]
    events: Mutex<VecDeque<Event>>,
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "telemetry")]
            events: Mutex::new(VecDeque::with_capacity(MAX_EVENTS)),
        }
    }

    pub fn record(&self, event: Event) {
        #[cfg(feature = "telemetry")]
        {
            match &event {
                Event::SessionStarted(user) => {
                    tracing::debug!(user = user.as_str(), "client telemetry session started")
                }
                Event::FilterChanged(summary) => tracing::debug!(
                    filter = summary.as_deref().unwrap_or("none"),
                    "client telemetry filter changed"
                ),
                Event::FetchRequested(token) => {
                    tracing::debug!(token, "client telemetry fetch requested")
                }
                Event::FetchApplied { token, count } => {
                    tracing::debug!(token, count, "client telemetry fetch applied")
                }
                Event::FetchDiscarded { token, latest } => {
                    tracing::debug!(token, latest, "client telemetry fetch discarded")
                }
                Event::FetchFailed { token, error } => {
                    tracing::debug!(token, error = %error, "client telemetry fetch failed")
                }
                Event::SubmitStarted(form) => {
                    tracing::debug!(form = *form, "client telemetry submit started")
                }
                Event::MutationApplied(action) => tracing::debug!(
                    action = action.as_str(),
                    "client telemetry mutation applied"
                ),
                Event::MutationFailed { action, error } => tracing::debug!(
                    action = action.as_str(),
                    error = %error,
                    "client telemetry mutation failed"
                ),
                Event::SessionEnded => tracing::debug!("client telemetry session ended"),
            }
            let mut events = self.events.lock();
            if events.len() == MAX_EVENTS {
                events.pop_front();
            }
            events.push_back(event);
        }
        #[cfg(not(feature = "telemetry"))]
        {
            let _ = event;
        }
    }

    pub fn is_enabled(&self) -> bool {
        cfg!(feature = "telemetry")
    }

    /// Events recorded so far; always empty when the feature is off.
    pub fn snapshot(&self) -> Vec<Event> {
        #[cfg(feature = "telemetry")]
        {
            self.events.lock().iter().cloned().collect()
        }
        #[cfg(not(feature = "telemetry"))]
        {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_events_when_enabled() {
        let handle = Handle::new();
        handle.record(Event::FetchApplied { token: 1, count: 2 });
        handle.record(Event::SessionEnded);
        if handle.is_enabled() {
            assert_eq!(handle.snapshot().len(), 2);
        } else {
            assert!(handle.snapshot().is_empty());
        }
    }

    #[cfg(feature = "telemetry")]
    #[test]
    fn keeps_only_the_newest_events() {
        let handle = Handle::new();
        for token in 0..(MAX_EVENTS as u64 + 10) {
            handle.record(Event::FetchRequested(token));
        }

        let events = handle.snapshot();
        assert_eq!(events.len(), MAX_EVENTS);
        assert!(matches!(events.first(), Some(Event::FetchRequested(10))));
        assert!(matches!(
            events.last(),
            Some(Event::FetchRequested(token)) if *token == MAX_EVENTS as u64 + 9
        ));
    }
}
