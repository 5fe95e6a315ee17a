//! Wire model for the collaboration channel.
//!
//! ARCHITECTURE
//! ============
//! All traffic with the collaboration backend is JSON text frames over a
//! single WebSocket. Outbound frames (`ClientFrame`) subscribe to a document's
//! event stream and publish presence; inbound frames (`ServerMessage`) wrap
//! either a `CollaborationEvent` or a user-facing notification. The transport
//! moves text without inspecting it; decoding lives here, dispatch lives in
//! `router`.
//!
//! DESIGN
//! ======
//! - camelCase field names and snake_case kind tags, matching the backend.
//! - Optional presence fields are omitted from the wire, never null.
//! - Inbound `data` stays a free-form `serde_json::Value` and inbound
//!   timestamps stay opaque strings, so an odd backend payload never costs us
//!   the event.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::session::PresenceUpdate;

// =============================================================================
// INBOUND TYPES
// =============================================================================

/// Kind tag of an inbound collaboration event.
///
/// `Unknown` absorbs kinds introduced by newer backends; the router drops
/// them without treating the frame as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UserJoined,
    UserLeft,
    CommentAdded,
    PresenceUpdate,
    CursorMove,
    SelectionChange,
    #[serde(other)]
    Unknown,
}

/// One inbound notification about remote activity on a document.
///
/// Transient: delivered to the observer and forgotten. `data` is
/// kind-specific (comment text, presence fields, ...) and intentionally
/// untyped here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub document_id: i64,
    pub user_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Backend-assigned, kept opaque.
    #[serde(default)]
    pub timestamp: String,
}

/// Out-of-band user-facing message, unrelated to presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Envelope for every inbound frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    CollaborationEvent { event: CollaborationEvent },
    Notification { notification: Notification },
}

impl ServerMessage {
    /// Decode one inbound text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// =============================================================================
// OUTBOUND TYPES
// =============================================================================

/// Every frame this client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Announces interest in a document's event stream. Sent immediately
    /// after every successful connect, including reconnects.
    #[serde(rename = "subscribe_document", rename_all = "camelCase")]
    Subscribe { document_id: i64, timestamp: String },
    /// Ends a subscription. `session_id` is present when a session was held
    /// at the time of leaving.
    #[serde(rename = "unsubscribe_document", rename_all = "camelCase")]
    Unsubscribe {
        document_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        timestamp: String,
    },
    /// Local presence delta tagged with the owning session.
    #[serde(rename = "presence_update", rename_all = "camelCase")]
    Presence {
        document_id: i64,
        session_id: String,
        #[serde(flatten)]
        update: PresenceUpdate,
        timestamp: String,
    },
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Current time as RFC 3339 UTC with millisecond precision.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl ClientFrame {
    #[must_use]
    pub fn subscribe(document_id: i64) -> Self {
        ClientFrame::Subscribe { document_id, timestamp: now_timestamp() }
    }

    #[must_use]
    pub fn unsubscribe(document_id: i64, session_id: Option<String>) -> Self {
        ClientFrame::Unsubscribe { document_id, session_id, timestamp: now_timestamp() }
    }

    #[must_use]
    pub fn presence(document_id: i64, session_id: impl Into<String>, update: PresenceUpdate) -> Self {
        ClientFrame::Presence {
            document_id,
            session_id: session_id.into(),
            update,
            timestamp: now_timestamp(),
        }
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
