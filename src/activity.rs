//! Visibility-driven activity tracking.
//!
//! DESIGN
//! ======
//! One small state machine: `viewing ⇄ idle`, driven only by environment
//! visibility signals. Explicit activities (`editing`, `commenting`) are
//! recorded so the tracker knows what the participant is doing, but
//! visibility never overrides them: backgrounding a tab must not erase an
//! "editing" signal. The tracker knows nothing about the transport; the
//! engine composes the two.

use crate::session::Activity;

/// Environment visibility signal fed in by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Tracks the local participant's activity across visibility changes.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    current: Activity,
}

impl ActivityTracker {
    #[must_use]
    pub fn new(initial: Activity) -> Self {
        Self { current: initial }
    }

    /// Record an activity set explicitly by the caller (join options or a
    /// presence update).
    pub fn record(&mut self, activity: Activity) {
        self.current = activity;
    }

    /// Activity as last observed.
    #[must_use]
    pub fn current(&self) -> Activity {
        self.current
    }

    /// Apply a visibility change. Returns the new activity when the change
    /// produces a transition worth broadcasting, `None` otherwise.
    ///
    /// `hidden` maps only `viewing → idle` and `visible` maps only
    /// `idle → viewing`.
    pub fn on_visibility(&mut self, visibility: Visibility) -> Option<Activity> {
        match (visibility, self.current) {
            (Visibility::Hidden, Activity::Viewing) => {
                self.current = Activity::Idle;
                Some(Activity::Idle)
            }
            (Visibility::Visible, Activity::Idle) => {
                self.current = Activity::Viewing;
                Some(Activity::Viewing)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;
