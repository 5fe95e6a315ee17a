//! Collaboration session & presence protocol client.
//!
//! This crate is the realtime half of a document-intelligence client: it
//! joins per-document collaboration sessions against an external backend,
//! keeps a single WebSocket event channel alive across disconnects, routes
//! inbound collaboration events to a host-supplied observer, and broadcasts
//! local presence (activity, cursor, selection) tagged with the owned
//! session. Rendering, authentication, and the analysis pipeline all live
//! elsewhere; this crate only speaks the wire protocol.
//!
//! Spawn one [`CollabEngine`] per open document. The returned
//! [`EngineHandle`] is fire-and-forget: completion and failure surface
//! through the [`SessionObserver`] callbacks and the status/session watch
//! channels, never through blocking returns.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use collab_client::{
//!     CollabEngine, EngineConfig, HttpSessionBackend, JoinOptions, SessionObserver,
//! };
//!
//! struct Ui;
//! impl SessionObserver for Ui {}
//!
//! # async fn demo() -> Result<(), collab_client::SessionError> {
//! let config = EngineConfig::from_env();
//! let backend = Arc::new(HttpSessionBackend::new(&config)?);
//! let handle = CollabEngine::spawn(&config, backend, 42, JoinOptions::default(), Box::new(Ui));
//! // ... feed visibility/presence, then:
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod activity;
mod backend;
mod config;
mod engine;
mod frame;
mod presence;
mod router;
mod session;
mod transport;

pub use activity::{ActivityTracker, Visibility};
pub use backend::{HttpSessionBackend, SessionBackend};
pub use config::EngineConfig;
pub use engine::{CollabEngine, EngineHandle};
pub use frame::{ClientFrame, CollaborationEvent, EventKind, Notification, ServerMessage};
pub use router::SessionObserver;
pub use session::{
    Activity, CollaborationSession, CreateSessionRequest, CursorPosition, JoinOptions,
    PresenceUpdate, SessionError, SessionStatus, TextSelection,
};
pub use transport::ConnectionStatus;
