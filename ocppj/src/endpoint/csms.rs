//! CSMS endpoint (websocket server side)
//!
//! One [`Dispatcher`] per connected station, keyed by the peer id the
//! transport assigned during the handshake.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Core, EndpointBuilder};
use crate::config::{EndpointConfig, ReconnectPolicy};
use crate::dispatcher::{Dispatcher, FrameWriter};
use crate::error::OcppError;
use crate::feature::Request;
use crate::transport::{CheckPeer, PeerRequest, ServerEvent, ServerTransport};

/// Peer lifecycle callback, receives the peer id
pub type PeerHook = Arc<dyn Fn(&str) + Send + Sync>;

struct Inner {
    core: Arc<Core>,
    transport: Arc<dyn ServerTransport>,
    peers: RwLock<HashMap<String, Dispatcher>>,
    check_peer: RwLock<Option<CheckPeer>>,
    on_new_peer: RwLock<Option<PeerHook>>,
    on_peer_disconnected: RwLock<Option<PeerHook>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

/// An OCPP-J central system
///
/// Cheap to clone; clones share the same listener and peers.
#[derive(Clone)]
pub struct Csms {
    inner: Arc<Inner>,
}

impl Csms {
    /// Start building a CSMS with `config`
    pub fn builder(config: EndpointConfig) -> EndpointBuilder {
        EndpointBuilder::new(config)
    }

    pub(crate) fn from_parts(core: Core, transport: Arc<dyn ServerTransport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                core: Arc::new(core),
                transport,
                peers: RwLock::new(HashMap::new()),
                check_peer: RwLock::new(None),
                on_new_peer: RwLock::new(None),
                on_peer_disconnected: RwLock::new(None),
                event_task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        self.inner.core.config()
    }

    /// Actions this CSMS knows, sorted
    pub fn actions(&self) -> Vec<&'static str> {
        self.inner.core.profiles().actions()
    }

    /// Handle inbound `R` requests; the handler receives the sending peer's id
    pub fn on<R, F, Fut>(&self, handler: F)
    where
        R: Request,
        F: Fn(String, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R::Response, OcppError>> + Send + 'static,
    {
        self.inner.core.register::<R, F, Fut>(handler);
    }

    pub fn on_new_peer(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.inner.on_new_peer.write() = Some(Arc::new(hook));
    }

    pub fn on_peer_disconnected(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.inner.on_peer_disconnected.write() = Some(Arc::new(hook));
    }

    /// Decide during the handshake whether to accept a station and which id
    /// to give it. Takes effect on the next `start`.
    pub fn set_check_peer(
        &self,
        check: impl Fn(&PeerRequest) -> Option<String> + Send + Sync + 'static,
    ) {
        *self.inner.check_peer.write() = Some(Arc::new(check));
    }

    /// Listen for stations on `port` under `path`
    pub async fn start(&self, port: u16, path: &str) -> Result<(), OcppError> {
        if self.inner.event_task.lock().is_some() {
            return Err(OcppError::AlreadyStarted);
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let check_peer = self.inner.check_peer.read().clone();
        self.inner
            .transport
            .start(port, path, check_peer, events_tx)
            .await?;

        info!(
            "CSMS listening on port {} at {} (OCPP {})",
            port,
            path,
            self.inner.core.config().version
        );

        let task = tokio::spawn(run_events(Arc::downgrade(&self.inner), events_rx));
        *self.inner.event_task.lock() = Some(task);
        Ok(())
    }

    /// Close the listener and every connection. Pending and queued requests
    /// fail with `ConnectionLost`.
    pub async fn stop(&self) {
        let task = self.inner.event_task.lock().take();
        let Some(task) = task else {
            return;
        };

        self.inner.transport.stop().await;
        task.abort();

        let peers: Vec<_> = self.inner.peers.write().drain().collect();
        for (_, dispatcher) in peers {
            dispatcher.close();
        }
        info!("CSMS stopped");
    }

    /// Send `request` to station `peer_id`. Returns the message id once the
    /// request is accepted; `callback` then runs exactly once with the
    /// outcome. A request failing validation is rejected here and its
    /// callback gets the same error. Other errors returned here leave the
    /// callback unrun.
    pub fn send_request<R, C>(
        &self,
        peer_id: &str,
        request: R,
        callback: C,
    ) -> Result<String, OcppError>
    where
        R: Request,
        C: FnOnce(Result<R::Response, OcppError>) + Send + 'static,
    {
        let dispatcher = self
            .inner
            .peers
            .read()
            .get(peer_id)
            .cloned()
            .ok_or_else(|| OcppError::UnknownPeer(peer_id.to_string()))?;
        self.inner.core.send(&dispatcher, request, callback)
    }

    /// Send `request` to `peer_id` and wait for the response
    pub async fn request<R: Request>(
        &self,
        peer_id: &str,
        request: R,
    ) -> Result<R::Response, OcppError> {
        let (tx, rx) = oneshot::channel();
        self.send_request(peer_id, request, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| OcppError::ConnectionLost)?
    }

    /// Ids of the currently connected stations, sorted
    pub fn connected_peers(&self) -> Vec<String> {
        let mut peers: Vec<_> = self
            .inner
            .peers
            .read()
            .iter()
            .filter(|(_, dispatcher)| dispatcher.is_connected())
            .map(|(id, _)| id.clone())
            .collect();
        peers.sort_unstable();
        peers
    }

    pub fn is_connected(&self, peer_id: &str) -> bool {
        self.inner
            .peers
            .read()
            .get(peer_id)
            .is_some_and(Dispatcher::is_connected)
    }
}

impl Inner {
    fn peer_connected(&self, peer_id: String) {
        let existing = self.peers.read().get(&peer_id).cloned();
        let dispatcher = match existing {
            Some(dispatcher) => {
                debug!("Resuming dispatcher for {}", peer_id);
                dispatcher
            }
            None => {
                let transport = self.transport.clone();
                let target = peer_id.clone();
                let writer: FrameWriter =
                    Arc::new(move |frame: &str| transport.write(&target, frame));
                let dispatcher =
                    Dispatcher::new(peer_id.clone(), self.core.config().clone(), writer);
                self.peers.write().insert(peer_id.clone(), dispatcher.clone());
                dispatcher
            }
        };

        dispatcher.connected();
        info!("Station {} connected", peer_id);

        let hook = self.on_new_peer.read().clone();
        if let Some(hook) = hook {
            hook(&peer_id);
        }
    }

    fn peer_disconnected(&self, peer_id: &str) {
        let dispatcher = match self.core.config().reconnect_policy {
            ReconnectPolicy::Strict => self.peers.write().remove(peer_id),
            ReconnectPolicy::Retain => self.peers.read().get(peer_id).cloned(),
        };
        let Some(dispatcher) = dispatcher else {
            debug!("Disconnect for unknown station {}", peer_id);
            return;
        };

        dispatcher.connection_lost();
        info!("Station {} disconnected", peer_id);

        let hook = self.on_peer_disconnected.read().clone();
        if let Some(hook) = hook {
            hook(peer_id);
        }
    }

    fn peer_message(&self, peer_id: &str, frame: &str) {
        let dispatcher = self.peers.read().get(peer_id).cloned();
        match dispatcher {
            Some(dispatcher) => self.core.handle_frame(&dispatcher, frame),
            None => warn!("Dropping frame from unknown station {}", peer_id),
        }
    }
}

async fn run_events(inner: Weak<Inner>, mut events: mpsc::UnboundedReceiver<ServerEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        match event {
            ServerEvent::Connected(peer_id) => inner.peer_connected(peer_id),
            ServerEvent::Message { peer_id, frame } => inner.peer_message(&peer_id, &frame),
            ServerEvent::Disconnected(peer_id) => inner.peer_disconnected(&peer_id),
            ServerEvent::Error { peer_id, error } => match peer_id {
                Some(peer_id) => warn!("Transport error on {}: {}", peer_id, error),
                None => warn!("Transport error: {}", error),
            },
        }
    }
}

impl std::fmt::Debug for Csms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Csms")
            .field("version", &self.inner.core.config().version)
            .field("peers", &self.inner.peers.read().len())
            .finish()
    }
}
