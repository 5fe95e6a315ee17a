//! The collaboration engine — one task, one document, one session.
//!
//! ARCHITECTURE
//! ============
//! `CollabEngine::spawn` starts a single task that owns every moving part:
//! the transport, the router, the activity tracker, and the session state.
//! Callers hold an [`EngineHandle`] whose methods are fire-and-forget sends
//! on the command channel; completion and failure surface through observer
//! callbacks and the status/session watch channels, never through blocking
//! returns. No locks anywhere: all mutable state lives inside the task.
//!
//! LIFECYCLE
//! =========
//! 1. Spawn → transport opens and subscribes → auto-join issued
//! 2. Commands and inbound frames interleave on one `select!` loop
//! 3. Unexpected closure → fixed-delay reconnect → re-subscribe
//! 4. Shutdown (or handle drop) → cancel reconnect, best-effort
//!    unsubscribe, close transport, clear session
//!
//! JOIN EPOCHS
//! ===========
//! Join requests run on spawned tasks so the loop never blocks on HTTP.
//! Every join/leave/shutdown bumps an epoch; a completion tagged with a
//! stale epoch is discarded. Rapid double-joins therefore converge on the
//! newest result, and a leave can never be resurrected by a late response.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activity::{ActivityTracker, Visibility};
use crate::backend::SessionBackend;
use crate::config::EngineConfig;
use crate::frame::ClientFrame;
use crate::presence::PresenceBroadcaster;
use crate::router::{Router, SessionObserver};
use crate::session::{
    CollaborationSession, CreateSessionRequest, CursorPosition, JoinOptions, PresenceUpdate,
    SessionError, TextSelection,
};
use crate::transport::{ConnectionStatus, Transport};

// =============================================================================
// COMMANDS
// =============================================================================

/// Everything a caller (or a spawned join task) can ask of the engine.
enum Command {
    Join(JoinOptions),
    JoinResolved {
        epoch: u64,
        result: Result<CollaborationSession, SessionError>,
    },
    Leave,
    UpdatePresence(PresenceUpdate),
    Visibility(Visibility),
    Shutdown,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Caller-side handle to a running engine.
///
/// Every method is fire-and-forget: it enqueues a command and returns.
/// Dropping the handle closes the command channel, which tears the engine
/// down the same way [`EngineHandle::shutdown`] does.
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<ConnectionStatus>,
    session_rx: watch::Receiver<Option<CollaborationSession>>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Request a session with the given options. Completion arrives via
    /// `SessionObserver::on_session_joined` / `on_join_failed` and the
    /// session watch channel. A join issued while another is pending
    /// supersedes it; the engine never tracks two sessions.
    pub fn join_session(&self, options: JoinOptions) {
        let _ = self.commands.send(Command::Join(options));
    }

    /// Leave the current session. Best-effort over the network, guaranteed
    /// locally: the tracked session clears even while disconnected. The
    /// engine does not auto-rejoin after an explicit leave.
    pub fn leave_session(&self) {
        let _ = self.commands.send(Command::Leave);
    }

    /// Merge a presence delta into the current session and broadcast it.
    ///
    /// Sent only while a session is tracked and the transport is open;
    /// otherwise the update is dropped silently, never queued. No rate
    /// limiting is applied here: callers driving high-frequency input
    /// (mouse movement) are expected to throttle before calling.
    pub fn update_presence(&self, update: PresenceUpdate) {
        let _ = self.commands.send(Command::UpdatePresence(update));
    }

    /// Broadcast a cursor move. Convenience over [`Self::update_presence`];
    /// the same throttling obligation applies.
    pub fn send_cursor_position(&self, cursor: CursorPosition) {
        self.update_presence(PresenceUpdate::default().with_cursor(cursor));
    }

    /// Broadcast a text selection. Convenience over [`Self::update_presence`].
    pub fn send_text_selection(&self, selection: TextSelection) {
        self.update_presence(PresenceUpdate::default().with_selection(selection));
    }

    /// Feed an environment visibility signal to the activity tracker.
    /// `hidden` maps `viewing → idle`, `visible` maps `idle → viewing`;
    /// explicit `editing`/`commenting` are never overridden.
    pub fn set_visibility(&self, visibility: Visibility) {
        let _ = self.commands.send(Command::Visibility(visibility));
    }

    /// Connectivity snapshot.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Tracked session snapshot.
    #[must_use]
    pub fn session(&self) -> Option<CollaborationSession> {
        self.session_rx.borrow().clone()
    }

    /// Watch connectivity transitions.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Watch the tracked session.
    #[must_use]
    pub fn watch_session(&self) -> watch::Receiver<Option<CollaborationSession>> {
        self.session_rx.clone()
    }

    /// Shut the engine down and wait for teardown to finish: any pending
    /// reconnect is cancelled, a best-effort unsubscribe goes out, the
    /// transport closes, and the session clears, in that order.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The engine task. Constructed and started via [`CollabEngine::spawn`].
pub struct CollabEngine {
    engine_id: Uuid,
    document_id: i64,
    backend: Arc<dyn SessionBackend>,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Clone handed to spawned join tasks so completions re-enter the loop.
    loopback: mpsc::UnboundedSender<Command>,
    transport: Transport,
    router: Router,
    broadcaster: PresenceBroadcaster,
    tracker: ActivityTracker,
    session: Option<CollaborationSession>,
    session_tx: watch::Sender<Option<CollaborationSession>>,
    epoch: u64,
}

impl CollabEngine {
    /// Spawn the engine for one document and issue the automatic join.
    /// The returned handle is the only way to reach it.
    #[must_use]
    pub fn spawn(
        config: &EngineConfig,
        backend: Arc<dyn SessionBackend>,
        document_id: i64,
        join: JoinOptions,
        observer: Box<dyn SessionObserver>,
    ) -> EngineHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (session_tx, session_rx) = watch::channel(None);

        let engine = CollabEngine {
            engine_id: Uuid::new_v4(),
            document_id,
            backend,
            commands: command_rx,
            loopback: command_tx.clone(),
            transport: Transport::new(
                config.ws_url.clone(),
                document_id,
                config.reconnect_delay,
                config.connect_timeout,
                status_tx,
            ),
            router: Router::new(observer),
            broadcaster: PresenceBroadcaster::new(document_id),
            tracker: ActivityTracker::new(join.activity),
            session: None,
            session_tx,
            epoch: 0,
        };

        let task = tokio::spawn(engine.run(join));
        EngineHandle { commands: command_tx, status_rx, session_rx, task }
    }

    async fn run(mut self, join: JoinOptions) {
        info!(engine_id = %self.engine_id, document_id = self.document_id, "engine: started");

        self.transport.open().await;
        self.begin_join(join);

        loop {
            let reconnect_at = self.transport.reconnect_at();
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                message = self.transport.next_message() => {
                    self.handle_socket_message(message);
                }
                () = reconnect_deadline(reconnect_at) => {
                    self.transport.open().await;
                }
            }
        }

        self.deactivate().await;
        info!(engine_id = %self.engine_id, document_id = self.document_id, "engine: stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Join(options) => self.begin_join(options),
            Command::JoinResolved { epoch, result } => self.finish_join(epoch, result),
            Command::Leave => self.leave().await,
            Command::UpdatePresence(update) => self.broadcast_presence(update).await,
            Command::Visibility(visibility) => self.visibility_changed(visibility).await,
            // Handled by the loop before dispatch.
            Command::Shutdown => {}
        }
    }

    fn handle_socket_message(&mut self, message: Option<Result<Message, WsError>>) {
        match message {
            Some(Ok(Message::Text(text))) => self.router.dispatch(text.as_str()),
            Some(Ok(Message::Close(_))) | None => {
                info!(document_id = self.document_id, "transport: channel closed by peer");
                self.transport.handle_closed();
            }
            Some(Ok(other)) => {
                debug!(kind = ?other, "transport: ignoring non-text message");
            }
            Some(Err(e)) => {
                warn!(error = %e, "transport: read failed");
                self.transport.handle_closed();
            }
        }
    }

    // =========================================================================
    // SESSION LIFECYCLE
    // =========================================================================

    /// Issue a create-session request on a spawned task. The completion
    /// re-enters the loop tagged with the epoch it was issued under.
    fn begin_join(&mut self, options: JoinOptions) {
        self.epoch += 1;
        let epoch = self.epoch;
        let request = CreateSessionRequest::from(&options);
        let backend = Arc::clone(&self.backend);
        let loopback = self.loopback.clone();
        let document_id = self.document_id;

        self.tracker.record(options.activity);
        info!(document_id, epoch, "session: join requested");

        tokio::spawn(async move {
            let result = backend.create_session(document_id, &request).await;
            let _ = loopback.send(Command::JoinResolved { epoch, result });
        });
    }

    fn finish_join(&mut self, epoch: u64, result: Result<CollaborationSession, SessionError>) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "session: discarding stale join completion");
            return;
        }

        match result {
            Ok(session) => {
                info!(
                    session_id = %session.session_id,
                    document_id = self.document_id,
                    "session: joined"
                );
                self.tracker.record(session.activity);
                self.router.notify_session_joined(&session);
                self.set_session(Some(session));
            }
            Err(e) => {
                warn!(
                    error = %e,
                    retryable = e.retryable(),
                    document_id = self.document_id,
                    "session: join failed"
                );
                self.router.notify_join_failed(&e);
            }
        }
    }

    /// Best-effort unsubscribe over the network, guaranteed local clear.
    async fn leave(&mut self) {
        self.epoch += 1;
        let Some(session) = self.session.take() else {
            debug!(document_id = self.document_id, "session: leave ignored, no session");
            return;
        };

        info!(session_id = %session.session_id, document_id = self.document_id, "session: leaving");
        let farewell = ClientFrame::unsubscribe(self.document_id, Some(session.session_id));
        self.transport.send(&farewell).await;
        self.session_tx.send_replace(None);
    }

    fn set_session(&mut self, session: Option<CollaborationSession>) {
        self.session = session;
        self.session_tx.send_replace(self.session.clone());
    }

    // =========================================================================
    // PRESENCE
    // =========================================================================

    async fn broadcast_presence(&mut self, update: PresenceUpdate) {
        // The tracker follows caller intent even when the send is dropped,
        // so a later visibility change never resurrects stale activity.
        if let Some(activity) = update.activity {
            self.tracker.record(activity);
        }
        self.send_presence(update).await;
    }

    async fn visibility_changed(&mut self, visibility: Visibility) {
        let Some(activity) = self.tracker.on_visibility(visibility) else {
            return;
        };
        debug!(?activity, document_id = self.document_id, "activity: visibility transition");
        self.send_presence(PresenceUpdate::default().with_activity(activity)).await;
    }

    async fn send_presence(&mut self, update: PresenceUpdate) {
        let Some(frame) =
            self.broadcaster.prepare(self.session.as_ref(), self.transport.is_open(), &update)
        else {
            return;
        };

        if self.transport.send(&frame).await {
            if let Some(session) = self.session.as_mut() {
                session.apply(&update);
                self.session_tx.send_replace(self.session.clone());
            }
        }
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Ordered teardown: the transport clears its reconnect deadline, sends
    /// the farewell if open, and closes; only then does the session clear.
    async fn deactivate(&mut self) {
        let session_id = self.session.as_ref().map(|s| s.session_id.clone());
        let farewell = ClientFrame::unsubscribe(self.document_id, session_id);
        self.transport.close(Some(farewell)).await;
        self.epoch += 1;
        self.set_session(None);
    }
}

/// Resolves at the armed reconnect deadline; pends forever when none is
/// armed.
async fn reconnect_deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
