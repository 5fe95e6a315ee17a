//! Session data model — the client's view of its own participation.
//!
//! DESIGN
//! ======
//! The engine holds authority over exactly one `CollaborationSession`: its
//! own. Other participants are only ever seen transiently through observer
//! callbacks, never stored. Presence fields merge in place via
//! [`PresenceUpdate`] deltas; the backend assigns identity and timestamps on
//! join.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by session requests against the collaboration backend.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The HTTP request to the backend failed before a response arrived.
    #[error("session request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("session response error: status {status}")]
    Api { status: u16, body: String },

    /// The backend response body could not be deserialized.
    #[error("session response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl SessionError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Api { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// PRESENCE PRIMITIVES
// =============================================================================

/// Connection-level status of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Idle,
    Disconnected,
}

/// What a participant is doing in the document.
///
/// Joins request `Viewing` by default; `Editing` and `Commenting` are set
/// explicitly by callers. `Idle` is produced by the visibility-driven
/// activity tracker, never requested at join time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Viewing,
    Editing,
    Commenting,
    Idle,
}

/// A cursor location within a paginated document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

/// A text range selected by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSelection {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A partial presence delta. Absent fields leave current state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<CursorPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<TextSelection>,
}

impl PresenceUpdate {
    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity = Some(activity);
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: CursorPosition) -> Self {
        self.cursor_position = Some(cursor);
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: TextSelection) -> Self {
        self.selection = Some(selection);
        self
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One client's participation in a document's collaborative context.
///
/// Created by a successful join; mutated by local presence updates; cleared
/// on leave or engine shutdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationSession {
    /// Backend-assigned, unique per active participation.
    pub session_id: String,
    pub document_id: i64,
    /// Assigned by the backend from ambient auth; not owned here.
    pub user_id: String,
    pub status: SessionStatus,
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<CursorPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<TextSelection>,
    pub joined_at: DateTime<Utc>,
    /// Unset until the session ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
}

impl CollaborationSession {
    /// Merge a presence delta into this session. Absent fields are kept.
    pub fn apply(&mut self, update: &PresenceUpdate) {
        if let Some(activity) = update.activity {
            self.activity = activity;
        }
        if let Some(cursor) = update.cursor_position {
            self.cursor_position = Some(cursor);
        }
        if let Some(selection) = &update.selection {
            self.selection = Some(selection.clone());
        }
    }
}

// =============================================================================
// JOIN TYPES
// =============================================================================

/// Caller input to a join. The engine always requests `status: active`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOptions {
    pub activity: Activity,
    pub cursor_position: Option<CursorPosition>,
    pub selection: Option<TextSelection>,
}

impl JoinOptions {
    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity = activity;
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: CursorPosition) -> Self {
        self.cursor_position = Some(cursor);
        self
    }
}

/// Body of the create-session request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub status: SessionStatus,
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<CursorPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<TextSelection>,
}

impl From<&JoinOptions> for CreateSessionRequest {
    fn from(options: &JoinOptions) -> Self {
        Self {
            status: SessionStatus::Active,
            activity: options.activity,
            cursor_position: options.cursor_position,
            selection: options.selection.clone(),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
