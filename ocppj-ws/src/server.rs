//! CSMS side WebSocket transport
//!
//! Stations connect to `ws://host:port/<path>/<station id>`. The upgrade is
//! refused unless the path matches, the client offers one of the configured
//! subprotocols and the check-peer hook (if any) accepts the request.
//! Each accepted connection gets a writer task fed by an unbounded channel;
//! the connection task itself reads.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use ocppj::transport::{CheckPeer, PeerRequest, ServerEvent, ServerTransport};
use ocppj::{OcppVersion, TransportError};
use parking_lot::{Mutex, RwLock};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header, HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::WsServerConfig;
use crate::{negotiate, read_loop, write_loop};

/// An upgraded connection registered under its peer id
struct Peer {
    connection: u64,
    version: OcppVersion,
    outbox: mpsc::UnboundedSender<Message>,
}

struct Inner {
    config: WsServerConfig,
    peers: RwLock<HashMap<String, Peer>>,
    connections: Mutex<HashMap<u64, AbortHandle>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    events: Mutex<Option<mpsc::UnboundedSender<ServerEvent>>>,
    local_addr: Mutex<Option<SocketAddr>>,
    next_connection: AtomicU64,
}

/// Multi-peer WebSocket server
#[derive(Clone)]
pub struct WsServer {
    inner: Arc<Inner>,
}

impl Default for WsServer {
    fn default() -> Self {
        Self::new(WsServerConfig::default())
    }
}

impl WsServer {
    pub fn new(config: WsServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                peers: RwLock::new(HashMap::new()),
                connections: Mutex::new(HashMap::new()),
                listener: Mutex::new(None),
                events: Mutex::new(None),
                local_addr: Mutex::new(None),
                next_connection: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &WsServerConfig {
        &self.inner.config
    }

    /// Bound address while running. Useful after starting on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.inner.local_addr.lock()
    }

    /// Connected peer ids, sorted
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<_> = self.inner.peers.read().keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Subprotocol version negotiated with `peer_id`
    pub fn peer_version(&self, peer_id: &str) -> Option<OcppVersion> {
        self.inner.peers.read().get(peer_id).map(|peer| peer.version)
    }
}

#[async_trait]
impl ServerTransport for WsServer {
    async fn start(
        &self,
        port: u16,
        path: &str,
        check_peer: Option<CheckPeer>,
        events: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<(), TransportError> {
        let listener = TcpListener::bind((self.inner.config.bind_address, port)).await?;
        let local_addr = listener.local_addr()?;
        info!("OCPP WebSocket server listening on {}{}", local_addr, path);

        *self.inner.local_addr.lock() = Some(local_addr);
        *self.inner.events.lock() = Some(events.clone());

        let inner = self.inner.clone();
        let path = path.to_string();
        let task = tokio::spawn(accept_loop(inner, listener, path, check_peer, events));
        if let Some(previous) = self.inner.listener.lock().replace(task) {
            previous.abort();
        }
        Ok(())
    }

    async fn stop(&self) {
        if let Some(task) = self.inner.listener.lock().take() {
            task.abort();
        }
        for (_, connection) in self.inner.connections.lock().drain() {
            connection.abort();
        }

        // dropping the outboxes lets every writer send its close frame
        let peers: Vec<_> = self.inner.peers.write().drain().map(|(id, _)| id).collect();
        if let Some(events) = self.inner.events.lock().take() {
            for peer_id in peers {
                let _ = events.send(ServerEvent::Disconnected(peer_id));
            }
        }
        *self.inner.local_addr.lock() = None;
        info!("OCPP WebSocket server stopped");
    }

    fn write(&self, peer_id: &str, frame: &str) -> Result<(), TransportError> {
        let peers = self.inner.peers.read();
        let peer = peers
            .get(peer_id)
            .ok_or_else(|| TransportError::PeerNotConnected(peer_id.to_string()))?;
        peer.outbox
            .send(Message::Text(frame.to_string()))
            .map_err(|_| TransportError::PeerNotConnected(peer_id.to_string()))
    }
}

async fn accept_loop(
    inner: Arc<Inner>,
    listener: TcpListener,
    path: String,
    check_peer: Option<CheckPeer>,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(%err, "Failed to accept connection");
                continue;
            }
        };

        let connection = inner.next_connection.fetch_add(1, Ordering::Relaxed);
        let mut connections = inner.connections.lock();
        let task = tokio::spawn(serve_connection(
            inner.clone(),
            stream,
            addr,
            connection,
            path.clone(),
            check_peer.clone(),
            events.clone(),
        ));
        connections.insert(connection, task.abort_handle());
    }
}

async fn serve_connection(
    inner: Arc<Inner>,
    stream: TcpStream,
    addr: SocketAddr,
    connection: u64,
    path: String,
    check_peer: Option<CheckPeer>,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    let config = &inner.config;
    let mut accepted: Option<(String, OcppVersion)> = None;

    let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        let (peer_id, version) = check_upgrade(config, &path, addr, check_peer.as_ref(), request)?;
        response.headers_mut().insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(version.subprotocol()),
        );
        accepted = Some((peer_id, version));
        Ok(response)
    };

    let handshake = tokio_tungstenite::accept_hdr_async_with_config(
        stream,
        callback,
        Some(config.websocket()),
    );
    let ws_stream = match timeout(config.timeouts.handshake_timeout, handshake).await {
        Ok(Ok(ws_stream)) => ws_stream,
        Ok(Err(err)) => {
            debug!(%addr, %err, "WebSocket handshake failed");
            inner.connections.lock().remove(&connection);
            return;
        }
        Err(_) => {
            warn!(%addr, "WebSocket handshake timed out");
            inner.connections.lock().remove(&connection);
            return;
        }
    };
    let Some((peer_id, version)) = accepted else {
        inner.connections.lock().remove(&connection);
        return;
    };

    let (sink, mut source) = ws_stream.split();
    let (outbox, queue) = mpsc::unbounded_channel();
    let ping_period = config.ping_clients.then_some(config.timeouts.ping_period);
    tokio::spawn(write_loop(sink, queue, config.timeouts.write_wait, ping_period));

    let replaced = inner.peers.write().insert(
        peer_id.clone(),
        Peer {
            connection,
            version,
            outbox,
        },
    );
    if replaced.is_some() {
        warn!(peer_id = %peer_id, "Station reconnected, dropping its previous connection");
        let _ = events.send(ServerEvent::Disconnected(peer_id.clone()));
    }
    info!(peer_id = %peer_id, %addr, subprotocol = version.subprotocol(), "Station connected");
    let _ = events.send(ServerEvent::Connected(peer_id.clone()));

    let reason = read_loop(&mut source, config.timeouts.pong_wait, |frame| {
        let _ = events.send(ServerEvent::Message {
            peer_id: peer_id.clone(),
            frame,
        });
    })
    .await;

    inner.connections.lock().remove(&connection);
    let current = {
        let mut peers = inner.peers.write();
        match peers.get(&peer_id) {
            Some(peer) if peer.connection == connection => peers.remove(&peer_id).is_some(),
            _ => false,
        }
    };
    if !current {
        return;
    }

    if let Some(error) = reason {
        warn!(peer_id = %peer_id, %error, "Station connection failed");
        let _ = events.send(ServerEvent::Error {
            peer_id: Some(peer_id.clone()),
            error,
        });
    }
    info!(peer_id = %peer_id, "Station disconnected");
    let _ = events.send(ServerEvent::Disconnected(peer_id));
}

/// Decide on an upgrade request: the peer id to register and the
/// negotiated version, or the HTTP error to answer with
fn check_upgrade(
    config: &WsServerConfig,
    path: &str,
    addr: SocketAddr,
    check_peer: Option<&CheckPeer>,
    request: &Request,
) -> Result<(String, OcppVersion), ErrorResponse> {
    let request_path = request.uri().path();
    if !under_path(path, request_path) {
        return Err(reject(StatusCode::NOT_FOUND, "unknown path"));
    }

    let offered = request
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let Some(version) = negotiate(&config.versions, offered) else {
        warn!(%addr, offered, "No supported OCPP subprotocol offered");
        return Err(reject(StatusCode::BAD_REQUEST, "unsupported subprotocol"));
    };

    let mut peer = PeerRequest::new(request_path);
    peer.remote_addr = Some(addr);
    peer.subprotocols = offered
        .split(',')
        .map(str::trim)
        .filter(|protocol| !protocol.is_empty())
        .map(String::from)
        .collect();

    let peer_id = match check_peer {
        Some(check) => check(&peer),
        None => Some(peer.station_id.clone()),
    };
    match peer_id.filter(|id| !id.is_empty()) {
        Some(peer_id) => Ok((peer_id, version)),
        None => {
            warn!(%addr, path = request_path, "Connection rejected");
            Err(reject(StatusCode::UNAUTHORIZED, "connection rejected"))
        }
    }
}

/// `/ocpp/CS001` is under `/ocpp`; `/ocpp` itself is not
fn under_path(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path.strip_prefix(prefix)
        .map_or(false, |rest| rest.len() > 1 && rest.starts_with('/'))
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}
