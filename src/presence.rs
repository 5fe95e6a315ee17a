//! Presence broadcasting — local state deltas onto the wire.
//!
//! DESIGN
//! ======
//! Presence is "latest wins": a delta is worth sending now or not at all.
//! `prepare` gates each update on an active session and an open transport
//! and otherwise drops it silently; there is no queue, and nothing is
//! replayed after a reconnect. Stale presence is not worth retaining.
//!
//! No rate limiting happens here. Callers driving high-frequency input
//! (mouse movement) are expected to throttle before reaching the engine.

use tracing::debug;

use crate::frame::ClientFrame;
use crate::session::{CollaborationSession, PresenceUpdate};

/// Builds `presence_update` frames tagged with the owning session.
pub struct PresenceBroadcaster {
    document_id: i64,
}

impl PresenceBroadcaster {
    #[must_use]
    pub fn new(document_id: i64) -> Self {
        Self { document_id }
    }

    /// Decide whether a presence delta goes out.
    ///
    /// Returns the frame to send when a session is tracked and the transport
    /// is open; returns `None` (silent drop) otherwise.
    pub fn prepare(
        &self,
        session: Option<&CollaborationSession>,
        transport_open: bool,
        update: &PresenceUpdate,
    ) -> Option<ClientFrame> {
        let Some(session) = session else {
            debug!(document_id = self.document_id, "presence: dropping update, no active session");
            return None;
        };
        if !transport_open {
            debug!(document_id = self.document_id, "presence: dropping update, transport closed");
            return None;
        }

        Some(ClientFrame::presence(self.document_id, session.session_id.clone(), update.clone()))
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
