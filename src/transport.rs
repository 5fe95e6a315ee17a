//! Transport connection — the engine's single WebSocket channel.
//!
//! DESIGN
//! ======
//! One owned connection per engine instance, never shared and never global.
//! `open` dials and immediately announces the document subscription before
//! reporting the channel open; unexpected closure arms a fixed-delay
//! reconnect deadline. The deadline is a single `Option<Instant>` slot, so
//! repeated flapping can never stack timers. The transport moves text frames
//! and never interprets them; decoding belongs to the router.
//!
//! ERROR HANDLING
//! ==============
//! Every failure (dial, send, read) collapses to "treat as closed, arm the
//! reconnect deadline". Nothing here is fatal and nothing is surfaced as an
//! error; hosts see only the `ConnectionStatus` watch value.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{Instant, timeout};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::frame::ClientFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state surfaced to hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection, and no dial in progress.
    #[default]
    Disconnected,
    /// A dial is in progress.
    Connecting,
    /// The channel is open and the document subscription is announced.
    Connected,
}

/// The engine's exclusively-owned channel to the collaboration backend.
pub struct Transport {
    ws_url: String,
    document_id: i64,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    socket: Option<WsStream>,
    reconnect_at: Option<Instant>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl Transport {
    pub fn new(
        ws_url: String,
        document_id: i64,
        reconnect_delay: Duration,
        connect_timeout: Duration,
        status_tx: watch::Sender<ConnectionStatus>,
    ) -> Self {
        Self {
            ws_url,
            document_id,
            reconnect_delay,
            connect_timeout,
            socket: None,
            reconnect_at: None,
            status_tx,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Armed reconnect deadline, if any.
    pub(crate) fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Establish the channel and announce the document subscription.
    ///
    /// No-op while already open. A failed dial arms the reconnect deadline,
    /// exactly like an unexpected closure.
    pub async fn open(&mut self) {
        self.reconnect_at = None;
        if self.socket.is_some() {
            debug!("transport: open ignored, channel already open");
            return;
        }

        self.set_status(ConnectionStatus::Connecting);
        // The dial is bounded so a blackholed endpoint cannot stall the
        // engine loop for the OS-level connect timeout.
        match timeout(self.connect_timeout, connect_async(self.ws_url.as_str())).await {
            Ok(Ok((socket, _))) => {
                self.socket = Some(socket);
                if self.send(&ClientFrame::subscribe(self.document_id)).await {
                    self.set_status(ConnectionStatus::Connected);
                    info!(document_id = self.document_id, "transport: connected");
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, url = %self.ws_url, "transport: connect failed");
                self.set_status(ConnectionStatus::Disconnected);
                self.schedule_reconnect();
            }
            Err(_) => {
                warn!(
                    url = %self.ws_url,
                    timeout = ?self.connect_timeout,
                    "transport: connect timed out"
                );
                self.set_status(ConnectionStatus::Disconnected);
                self.schedule_reconnect();
            }
        }
    }

    /// Send one frame. Returns `false` when the channel is closed or the
    /// write fails; a failed write counts as an unexpected closure.
    pub async fn send(&mut self, frame: &ClientFrame) -> bool {
        let Some(socket) = self.socket.as_mut() else {
            debug!("transport: send skipped, channel closed");
            return false;
        };

        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "transport: failed to serialize frame");
                return false;
            }
        };

        if let Err(e) = socket.send(Message::text(text)).await {
            warn!(error = %e, "transport: send failed");
            self.handle_closed();
            return false;
        }
        true
    }

    /// Next raw message from the socket. Pends forever while the channel is
    /// closed, so it can sit in a `select!` arm unconditionally.
    pub async fn next_message(&mut self) -> Option<Result<Message, WsError>> {
        match self.socket.as_mut() {
            Some(socket) => socket.next().await,
            None => std::future::pending().await,
        }
    }

    /// Treat the channel as closed and arm the reconnect deadline.
    pub fn handle_closed(&mut self) {
        self.socket = None;
        self.set_status(ConnectionStatus::Disconnected);
        self.schedule_reconnect();
    }

    /// Caller-initiated teardown: clear any armed reconnect deadline, send a
    /// best-effort farewell frame, then terminate the channel.
    pub async fn close(&mut self, farewell: Option<ClientFrame>) {
        self.reconnect_at = None;
        if let Some(mut socket) = self.socket.take() {
            if let Some(frame) = farewell {
                if let Ok(text) = frame.encode() {
                    let _ = socket.send(Message::text(text)).await;
                }
            }
            let _ = socket.close(None).await;
            info!(document_id = self.document_id, "transport: closed");
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn schedule_reconnect(&mut self) {
        self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
        info!(delay = ?self.reconnect_delay, "transport: reconnect armed");
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
