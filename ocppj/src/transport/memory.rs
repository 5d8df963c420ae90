//! In-process transports
//!
//! [`MemoryClientTransport`] and [`MemoryServerTransport`] implement the
//! transport traits over channels. The other side of each connection is a
//! [`RemotePeer`]: it reads the frames the endpoint wrote and injects frames,
//! disconnects and reconnects. Used by tests and local simulations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use super::{
    CheckPeer, ClientEvent, ClientTransport, PeerRequest, ServerEvent, ServerTransport,
    TransportError,
};
use crate::version::OcppVersion;

// ============================================================================
// Client side
// ============================================================================

struct ClientLink {
    events: Mutex<Option<mpsc::UnboundedSender<ClientEvent>>>,
    frames: mpsc::UnboundedSender<String>,
    connected: AtomicBool,
    url: Mutex<Option<String>>,
    refuse: AtomicBool,
}

impl ClientLink {
    fn emit(&self, event: ClientEvent) -> bool {
        match self.events.lock().as_ref() {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
    }
}

/// Client transport connected to a [`RemotePeer`] standing in for the CSMS
#[derive(Clone)]
pub struct MemoryClientTransport {
    link: Arc<ClientLink>,
}

impl MemoryClientTransport {
    /// A transport and the peer at its other end
    pub fn pair() -> (Self, RemotePeer) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let link = Arc::new(ClientLink {
            events: Mutex::new(None),
            frames: frames_tx,
            connected: AtomicBool::new(false),
            url: Mutex::new(None),
            refuse: AtomicBool::new(false),
        });

        let peer = RemotePeer {
            side: Side::Client(link.clone()),
            frames: frames_rx,
        };
        (Self { link }, peer)
    }

    /// URL passed to the last successful `start`
    pub fn url(&self) -> Option<String> {
        self.link.url.lock().clone()
    }

    /// Make the next `start` calls fail with a handshake error
    pub fn refuse_connections(&self, refuse: bool) {
        self.link.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClientTransport for MemoryClientTransport {
    async fn start(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<(), TransportError> {
        if self.link.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Handshake(format!("connection to {url} refused")));
        }
        *self.link.url.lock() = Some(url.to_string());
        *self.link.events.lock() = Some(events);
        self.link.connected.store(true, Ordering::SeqCst);
        debug!("Memory client connected to {}", url);
        Ok(())
    }

    async fn stop(&self) {
        self.link.connected.store(false, Ordering::SeqCst);
        self.link.events.lock().take();
    }

    fn write(&self, frame: &str) -> Result<(), TransportError> {
        if !self.link.connected.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.link
            .frames
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.link.connected.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Server side
// ============================================================================

struct Listener {
    path: String,
    check_peer: Option<CheckPeer>,
    events: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct Hub {
    listener: Mutex<Option<Listener>>,
    peers: Mutex<HashMap<String, mpsc::UnboundedSender<String>>>,
}

impl Hub {
    fn emit(&self, event: ServerEvent) -> bool {
        match self.listener.lock().as_ref() {
            Some(listener) => listener.events.send(event).is_ok(),
            None => false,
        }
    }
}

/// Server transport accepting [`RemotePeer`] stations
#[derive(Clone, Default)]
pub struct MemoryServerTransport {
    hub: Arc<Hub>,
}

impl MemoryServerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.hub.listener.lock().is_some()
    }

    /// Connect a station as if it opened `<path>/<station_id>`. The
    /// check-peer hook decides acceptance and the assigned peer id.
    pub fn connect(&self, station_id: &str) -> Result<RemotePeer, TransportError> {
        self.connect_with_protocol(station_id, OcppVersion::V201)
    }

    /// Like [`connect`](Self::connect), offering the subprotocol of `version`
    pub fn connect_with_protocol(
        &self,
        station_id: &str,
        version: OcppVersion,
    ) -> Result<RemotePeer, TransportError> {
        let (path, check_peer) = {
            let listener = self.hub.listener.lock();
            let listener = listener.as_ref().ok_or(TransportError::NotRunning)?;
            (listener.path.clone(), listener.check_peer.clone())
        };

        let mut request = PeerRequest::new(format!("{}/{}", path.trim_end_matches('/'), station_id));
        request.subprotocols = vec![version.subprotocol().to_string()];

        let peer_id = match check_peer {
            Some(check) => check(&request).ok_or_else(|| {
                TransportError::Handshake(format!("station {station_id} rejected"))
            })?,
            None => request.station_id.clone(),
        };

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        self.hub.peers.lock().insert(peer_id.clone(), frames_tx);
        self.hub.emit(ServerEvent::Connected(peer_id.clone()));

        Ok(RemotePeer {
            side: Side::Server {
                hub: self.hub.clone(),
                peer_id,
            },
            frames: frames_rx,
        })
    }
}

#[async_trait]
impl ServerTransport for MemoryServerTransport {
    async fn start(
        &self,
        _port: u16,
        path: &str,
        check_peer: Option<CheckPeer>,
        events: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<(), TransportError> {
        *self.hub.listener.lock() = Some(Listener {
            path: path.to_string(),
            check_peer,
            events,
        });
        Ok(())
    }

    async fn stop(&self) {
        let peers: Vec<String> = self.hub.peers.lock().drain().map(|(id, _)| id).collect();
        for peer_id in peers {
            self.hub.emit(ServerEvent::Disconnected(peer_id));
        }
        self.hub.listener.lock().take();
    }

    fn write(&self, peer_id: &str, frame: &str) -> Result<(), TransportError> {
        let peers = self.hub.peers.lock();
        let peer = peers
            .get(peer_id)
            .ok_or_else(|| TransportError::PeerNotConnected(peer_id.to_string()))?;
        peer.send(frame.to_string())
            .map_err(|_| TransportError::PeerNotConnected(peer_id.to_string()))
    }
}

// ============================================================================
// Remote peer
// ============================================================================

enum Side {
    Client(Arc<ClientLink>),
    Server { hub: Arc<Hub>, peer_id: String },
}

/// The far end of an in-memory connection
pub struct RemotePeer {
    side: Side,
    frames: mpsc::UnboundedReceiver<String>,
}

impl RemotePeer {
    /// Peer id on the server side; the station id passed to the client
    /// transport's URL on the client side
    pub fn peer_id(&self) -> String {
        match &self.side {
            Side::Client(link) => link
                .url
                .lock()
                .as_deref()
                .and_then(super::station_id_from_path)
                .unwrap_or_default()
                .to_string(),
            Side::Server { peer_id, .. } => peer_id.clone(),
        }
    }

    /// Next frame written by the endpoint
    pub async fn next_frame(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    /// A frame written by the endpoint, if one is waiting
    pub fn try_next_frame(&mut self) -> Option<String> {
        self.frames.try_recv().ok()
    }

    /// Deliver `frame` to the endpoint. Returns false if the connection is down.
    pub fn send(&self, frame: impl Into<String>) -> bool {
        let frame = frame.into();
        match &self.side {
            Side::Client(link) => {
                link.connected.load(Ordering::SeqCst) && link.emit(ClientEvent::Message(frame))
            }
            Side::Server { hub, peer_id } => {
                hub.peers.lock().contains_key(peer_id)
                    && hub.emit(ServerEvent::Message {
                        peer_id: peer_id.clone(),
                        frame,
                    })
            }
        }
    }

    /// Drop the connection
    pub fn disconnect(&self) {
        match &self.side {
            Side::Client(link) => {
                if link.connected.swap(false, Ordering::SeqCst) {
                    link.emit(ClientEvent::Disconnected(Some(TransportError::Closed)));
                }
            }
            Side::Server { hub, peer_id } => {
                if hub.peers.lock().remove(peer_id).is_some() {
                    hub.emit(ServerEvent::Disconnected(peer_id.clone()));
                }
            }
        }
    }

    /// Re-establish a dropped connection under the same id
    pub fn reconnect(&mut self) {
        match &self.side {
            Side::Client(link) => {
                if !link.connected.swap(true, Ordering::SeqCst) {
                    link.emit(ClientEvent::Reconnected);
                }
            }
            Side::Server { hub, peer_id } => {
                let (frames_tx, frames_rx) = mpsc::unbounded_channel();
                hub.peers.lock().insert(peer_id.clone(), frames_tx);
                self.frames = frames_rx;
                hub.emit(ServerEvent::Connected(peer_id.clone()));
            }
        }
    }

    /// Report an asynchronous transport error to a client endpoint
    pub fn report_error(&self, error: TransportError) {
        match &self.side {
            Side::Client(link) => {
                link.emit(ClientEvent::Error(error));
            }
            Side::Server { hub, peer_id } => {
                hub.emit(ServerEvent::Error {
                    peer_id: Some(peer_id.clone()),
                    error,
                });
            }
        }
    }
}

impl std::fmt::Debug for RemotePeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemotePeer")
            .field("peer_id", &self.peer_id())
            .finish()
    }
}
