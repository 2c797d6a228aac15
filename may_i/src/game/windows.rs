//! Timed decision windows.
//!
//! The engine decides when a window opens and what its expiry does. Driving
//! the clock is the caller's job: it holds the [`WindowToken`] and hands it
//! back when its timer fires. Tokens go stale whenever a newer window opens,
//! a manual discard lands, or a round ends, and a stale token does nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum WindowKind {
    /// Other players may ask to buy the discard that just landed.
    Buy,
    /// The acting player must discard or have a card discarded for them.
    Discard,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Buy => "buy",
            Self::Discard => "discard",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct WindowToken {
    pub kind: WindowKind,
    pub generation: u64,
}

/// At most one window is open at a time.
#[derive(Debug, Default)]
pub struct WindowTracker {
    generation: u64,
    open: Option<WindowToken>,
}

impl WindowTracker {
    pub fn open(&mut self, kind: WindowKind) -> WindowToken {
        self.generation += 1;
        let token = WindowToken {
            kind,
            generation: self.generation,
        };
        self.open = Some(token);
        token
    }

    /// Close `token` if it's still the open window. Returns whether it was.
    pub fn close(&mut self, token: WindowToken) -> bool {
        if self.is_open(token) {
            self.open = None;
            true
        } else {
            false
        }
    }

    /// Invalidate whatever is open.
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        self.open = None;
    }

    #[must_use]
    pub fn is_open(&self, token: WindowToken) -> bool {
        self.open == Some(token)
    }

    #[must_use]
    pub fn current(&self) -> Option<WindowToken> {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_supersedes_old() {
        let mut tracker = WindowTracker::default();
        let buy = tracker.open(WindowKind::Buy);
        let discard = tracker.open(WindowKind::Discard);

        assert!(!tracker.is_open(buy));
        assert!(tracker.is_open(discard));
        assert_eq!(tracker.current(), Some(discard));
    }

    #[test]
    fn test_close_is_one_shot() {
        let mut tracker = WindowTracker::default();
        let token = tracker.open(WindowKind::Buy);

        assert!(tracker.close(token));
        assert!(!tracker.close(token));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_cancel_all_invalidates() {
        let mut tracker = WindowTracker::default();
        let token = tracker.open(WindowKind::Discard);
        tracker.cancel_all();

        assert!(!tracker.is_open(token));
        let next = tracker.open(WindowKind::Discard);
        assert_ne!(token, next);
    }
}
