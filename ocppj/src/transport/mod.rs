//! Transport abstraction
//!
//! Endpoints never touch HTTP, TLS or websocket framing. They drive a
//! [`ServerTransport`] (CSMS side, many peers) or a [`ClientTransport`]
//! (station side, one connection) and consume the events those transports
//! push into an unbounded channel.
//!
//! `write` is synchronous: implementations hand the frame to a per-connection
//! writer task, so frames written from one thread reach the socket in order.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod memory;

/// Errors raised by transports
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("peer {0} is not connected")]
    PeerNotConnected(String),

    #[error("transport is not running")]
    NotRunning,

    #[error("connection closed")]
    Closed,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("websocket error: {0}")]
    WebSocket(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Connection attempt presented to the check-peer hook
#[derive(Debug, Clone)]
pub struct PeerRequest {
    /// Full request path, e.g. `/ocpp/CS001`
    pub path: String,
    /// Last path segment, the default peer id
    pub station_id: String,
    pub remote_addr: Option<SocketAddr>,
    /// Subprotocols offered by the client
    pub subprotocols: Vec<String>,
}

impl PeerRequest {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let station_id = station_id_from_path(&path).unwrap_or_default().to_string();
        Self {
            path,
            station_id,
            remote_addr: None,
            subprotocols: Vec::new(),
        }
    }
}

/// Decides whether to accept a connection and which peer id to assign it.
/// Returning `None` rejects the connection.
pub type CheckPeer = Arc<dyn Fn(&PeerRequest) -> Option<String> + Send + Sync>;

/// Events produced by a server transport
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connected(String),
    Message { peer_id: String, frame: String },
    Disconnected(String),
    Error { peer_id: Option<String>, error: TransportError },
}

/// Events produced by a client transport
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Message(String),
    /// Connection dropped; the transport may try to reconnect
    Disconnected(Option<TransportError>),
    /// Connection re-established after a drop
    Reconnected,
    /// Informational, asynchronous transport error
    Error(TransportError),
}

/// Multi-peer server transport (CSMS side)
#[async_trait]
pub trait ServerTransport: Send + Sync + 'static {
    /// Start listening on `port`, accepting websocket upgrades under `path`.
    /// Returns once the listener is bound.
    async fn start(
        &self,
        port: u16,
        path: &str,
        check_peer: Option<CheckPeer>,
        events: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<(), TransportError>;

    /// Close the listener and every connection
    async fn stop(&self);

    /// Queue a text frame for `peer_id`
    fn write(&self, peer_id: &str, frame: &str) -> Result<(), TransportError>;
}

/// Single-connection client transport (station side)
#[async_trait]
pub trait ClientTransport: Send + Sync + 'static {
    /// Connect to `url`. Returns once the first connection is established.
    async fn start(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<(), TransportError>;

    /// Close the connection and stop reconnecting
    async fn stop(&self);

    /// Queue a text frame for the server
    fn write(&self, frame: &str) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;
}

/// Build the full OCPP websocket URL for a station
pub fn build_ocpp_url(base_url: &str, station_id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), station_id)
}

/// Last non-empty path segment, ignoring any query string
pub fn station_id_from_path(path: &str) -> Option<&str> {
    let path = path.split('?').next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
