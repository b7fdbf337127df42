//! Status text shown to the operator.
//!
//! [`MessageLog`] keeps the newest message first and drops the oldest one
//! each time it has been on screen for longer than the configured interval,
//! so a burst of messages drains one by one.
//!
//! # Example
//!
//! ```rust
//! use plastey_hal::sim::ManualClock;
//! use plastey_hal::text::{MessageLog, TextSink};
//!
//! let clock = ManualClock::new();
//! let mut log = MessageLog::new(Box::new(clock.clone()), 3.0);
//! log.write("Vertex 4 selected");
//! assert_eq!(log.headline(), Some("Vertex 4 selected"));
//!
//! clock.advance(3.0);
//! log.refresh();
//! assert!(log.is_empty());
//! ```

use std::collections::VecDeque;

use tracing::info;

use crate::clock::Clock;

/// Destination for operator-facing status messages.
pub trait TextSink {
    fn write(&mut self, message: &str);

    /// Drop every message.
    fn clear(&mut self);

    /// Called once per frame; time-based sinks expire messages here.
    fn refresh(&mut self) {}
}

/// Timed message log backing the HUD.
pub struct MessageLog {
    clock: Box<dyn Clock>,
    interval: f64,
    /// `(written_at, text)`, newest first.
    messages: VecDeque<(f64, String)>,
}

impl MessageLog {
    pub fn new(clock: Box<dyn Clock>, interval: f64) -> Self {
        Self {
            clock,
            interval,
            messages: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Newest message.
    pub fn headline(&self) -> Option<&str> {
        self.messages.front().map(|(_, m)| m.as_str())
    }

    /// All messages, newest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|(_, m)| m.as_str())
    }
}

impl TextSink for MessageLog {
    fn write(&mut self, message: &str) {
        info!(target: "plastey::hud", "{message}");
        self.messages.push_front((self.clock.now(), message.to_string()));
    }

    fn clear(&mut self) {
        self.messages.clear();
    }

    fn refresh(&mut self) {
        let now = self.clock.now();
        if let Some((written_at, _)) = self.messages.back()
            && written_at + self.interval <= now
        {
            self.messages.pop_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ManualClock;

    fn log(clock: &ManualClock) -> MessageLog {
        MessageLog::new(Box::new(clock.clone()), 2.0)
    }

    #[test]
    fn newest_message_comes_first() {
        let clock = ManualClock::new();
        let mut log = log(&clock);
        log.write("first");
        log.write("second");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["second", "first"]);
    }

    #[test]
    fn refresh_drops_one_expired_message_per_frame() {
        let clock = ManualClock::new();
        let mut log = log(&clock);
        log.write("a");
        log.write("b");
        clock.advance(1.0);
        log.refresh();
        assert_eq!(log.len(), 2);

        clock.advance(1.0);
        log.refresh();
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["b"]);
        log.refresh();
        assert!(log.is_empty());
    }

    #[test]
    fn clear_empties_log() {
        let clock = ManualClock::new();
        let mut log = log(&clock);
        log.write("a");
        log.clear();
        assert!(log.headline().is_none());
    }
}
