//! Inbound event routing — decode, classify, dispatch.
//!
//! DESIGN
//! ======
//! The transport hands every inbound text frame to [`Router::dispatch`],
//! which decodes the envelope and invokes the matching [`SessionObserver`]
//! method. `cursor_move` and `selection_change` share the presence-update
//! path with `presence_update`: all three carry ephemeral remote state, not
//! durable facts.
//!
//! ERROR HANDLING
//! ==============
//! Fail-soft. Malformed frames and unknown kinds are logged and dropped; one
//! corrupt frame never tears down a healthy connection, and nothing here is
//! surfaced to the caller as an error.

use tracing::{debug, warn};

use crate::frame::{CollaborationEvent, EventKind, Notification, ServerMessage};
use crate::session::{CollaborationSession, SessionError};

// =============================================================================
// OBSERVER
// =============================================================================

/// Capability interface for everything the engine reports outward.
///
/// One method per event kind, each defaulted to a no-op so hosts implement
/// only what they need. Every method is invoked from the engine task.
pub trait SessionObserver: Send {
    /// A remote participant joined the document.
    fn on_user_joined(&mut self, event: &CollaborationEvent) {
        let _ = event;
    }

    /// A remote participant left the document.
    fn on_user_left(&mut self, event: &CollaborationEvent) {
        let _ = event;
    }

    /// A comment was added to the document.
    fn on_comment_added(&mut self, event: &CollaborationEvent) {
        let _ = event;
    }

    /// Remote presence changed. Receives `presence_update`, `cursor_move`,
    /// and `selection_change` events alike.
    fn on_presence_update(&mut self, event: &CollaborationEvent) {
        let _ = event;
    }

    /// Out-of-band user-facing message.
    fn on_notification(&mut self, notification: &Notification) {
        let _ = notification;
    }

    /// Roster or comment data cached outside the engine may be stale for
    /// this document. The event is the trigger, not the snapshot; callers
    /// refetch what they cache.
    fn on_invalidate(&mut self, document_id: i64) {
        let _ = document_id;
    }

    /// The engine's own join completed and the session is now tracked.
    fn on_session_joined(&mut self, session: &CollaborationSession) {
        let _ = session;
    }

    /// The engine's own join failed. The engine does not retry; whether to
    /// is the caller's decision, and [`SessionError::retryable`] says
    /// whether re-issuing the same join may succeed.
    fn on_join_failed(&mut self, error: &SessionError) {
        let _ = error;
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Owns the observer and turns raw inbound text into callbacks.
pub struct Router {
    observer: Box<dyn SessionObserver>,
}

impl Router {
    #[must_use]
    pub fn new(observer: Box<dyn SessionObserver>) -> Self {
        Self { observer }
    }

    /// Decode one inbound text frame and dispatch it.
    pub fn dispatch(&mut self, text: &str) {
        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "router: dropping malformed frame");
                return;
            }
        };

        match message {
            ServerMessage::CollaborationEvent { event } => self.dispatch_event(&event),
            ServerMessage::Notification { notification } => {
                self.observer.on_notification(&notification);
            }
        }
    }

    fn dispatch_event(&mut self, event: &CollaborationEvent) {
        match event.kind {
            EventKind::UserJoined => self.observer.on_user_joined(event),
            EventKind::UserLeft => self.observer.on_user_left(event),
            EventKind::CommentAdded => self.observer.on_comment_added(event),
            EventKind::PresenceUpdate | EventKind::CursorMove | EventKind::SelectionChange => {
                self.observer.on_presence_update(event);
            }
            EventKind::Unknown => {
                debug!(document_id = event.document_id, "router: dropping unknown event kind");
                return;
            }
        }

        if invalidates_cached_state(event.kind) {
            self.observer.on_invalidate(event.document_id);
        }
    }

    /// Forward a join completion to the observer.
    pub fn notify_session_joined(&mut self, session: &CollaborationSession) {
        self.observer.on_session_joined(session);
    }

    /// Forward a join failure to the observer.
    pub fn notify_join_failed(&mut self, error: &SessionError) {
        self.observer.on_join_failed(error);
    }
}

/// Kinds that affect roster/comment data cached outside the engine.
/// Cursor and selection movement is too ephemeral to be worth a refetch.
fn invalidates_cached_state(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::UserJoined | EventKind::UserLeft | EventKind::CommentAdded | EventKind::PresenceUpdate
    )
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
