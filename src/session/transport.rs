//! WebSocket session with the service under test
//!
//! Owns the single long-lived channel for one conversation. The service
//! speaks first: a session only becomes usable once the `connection`
//! acknowledgement has arrived and supplied the session id.

use std::fmt;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

use crate::common::{Error, Result};
use crate::wire::{codec, Envelope};

/// Lifecycle state of the underlying channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Connecting => "connecting",
            TransportState::Open => "open",
            TransportState::Closed => "closed",
            TransportState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One conversation with the remote service
///
/// Dropping the session releases the socket on every exit path, including
/// cancellation; [`ChatSession::close`] additionally sends a close frame.
pub struct ChatSession {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    session_id: String,
    greeting: String,
    state: TransportState,
}

impl ChatSession {
    /// Connect to the service and wait for the session acknowledgement
    ///
    /// The timeout bounds the whole sequence: TCP/WebSocket handshake plus
    /// the wait for the `connection` envelope. A refused or unreachable
    /// endpoint fails with `TransportUnavailable`; a service that accepts
    /// the socket but never acknowledges fails with `ConnectTimeout`.
    pub async fn connect(endpoint: &str, connect_timeout: Duration) -> Result<Self> {
        let deadline = tokio::time::Instant::now() + connect_timeout;
        let timeout_secs = connect_timeout.as_secs();

        let (socket, _response) = tokio::time::timeout(connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| Error::ConnectTimeout(timeout_secs))?
            .map_err(|e| Error::transport_unavailable(endpoint, e))?;

        tracing::debug!(%endpoint, "websocket open, waiting for acknowledgement");

        let mut session = Self {
            socket,
            session_id: String::new(),
            greeting: String::new(),
            state: TransportState::Connecting,
        };

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(Error::ConnectTimeout(timeout_secs));
            }

            match session.receive(remaining).await {
                Ok(Envelope::Connected(ack)) => {
                    tracing::debug!(session_id = %ack.session_id, "session acknowledged");
                    session.session_id = ack.session_id;
                    session.greeting = ack.message;
                    session.state = TransportState::Open;
                    return Ok(session);
                }
                Ok(other) => {
                    tracing::debug!(kind = other.kind(), "envelope before acknowledgement, skipping");
                }
                Err(Error::ReceiveTimeout(_)) => return Err(Error::ConnectTimeout(timeout_secs)),
                Err(Error::MalformedEnvelope(detail)) | Err(Error::UnknownKind(detail)) => {
                    tracing::warn!(%detail, "undecodable envelope before acknowledgement");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Session identifier assigned by the service, read-only once set
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Welcome message carried by the connection acknowledgement
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Serialize and write one envelope
    pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
        if self.state != TransportState::Open {
            return Err(Error::SendFailed(format!("channel is {}", self.state)));
        }

        let text = codec::encode(envelope)?;
        tracing::debug!("chat >>> {text}");

        self.socket
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| {
                self.state = TransportState::Failed;
                Error::SendFailed(e.to_string())
            })
    }

    /// Build and send the question envelope for one step
    ///
    /// Every outbound question carries the session id and the requester id.
    pub async fn ask(&mut self, content: &str, user_id: &str) -> Result<()> {
        let envelope = Envelope::user_message(content, &self.session_id, user_id);
        self.send(&envelope).await
    }

    /// Wait for the next inbound envelope
    ///
    /// The timeout covers the whole call; control frames consumed along the
    /// way do not re-arm it. Stream end, a close frame and transport errors
    /// all surface as `ChannelClosed`.
    pub async fn receive(&mut self, timeout: Duration) -> Result<Envelope> {
        if matches!(self.state, TransportState::Closed | TransportState::Failed) {
            return Err(Error::ChannelClosed);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let timeout_ms = timeout.as_millis() as u64;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(Error::ReceiveTimeout(timeout_ms));
            }

            let frame = match tokio::time::timeout(remaining, self.socket.next()).await {
                Err(_) => return Err(Error::ReceiveTimeout(timeout_ms)),
                Ok(None) => {
                    self.state = TransportState::Closed;
                    return Err(Error::ChannelClosed);
                }
                Ok(Some(Err(e))) => {
                    tracing::debug!(error = %e, "websocket read failed");
                    self.state = TransportState::Failed;
                    return Err(Error::ChannelClosed);
                }
                Ok(Some(Ok(frame))) => frame,
            };

            match frame {
                WsMessage::Text(text) => {
                    tracing::debug!("chat <<< {text}");
                    return codec::decode(text.as_str());
                }
                WsMessage::Binary(bytes) => {
                    let text = std::str::from_utf8(&bytes).map_err(|e| {
                        Error::MalformedEnvelope(format!("binary frame is not UTF-8: {e}"))
                    })?;
                    return codec::decode(text);
                }
                WsMessage::Close(_) => {
                    self.state = TransportState::Closed;
                    return Err(Error::ChannelClosed);
                }
                // ping/pong keepalives are not protocol envelopes
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            }
        }
    }

    /// Send a close frame and mark the channel closed
    ///
    /// Best-effort and idempotent; the socket itself is released on drop.
    pub async fn close(&mut self) {
        if matches!(self.state, TransportState::Closed | TransportState::Failed) {
            return;
        }
        let _ = self.socket.close(None).await;
        self.state = TransportState::Closed;
    }
}
