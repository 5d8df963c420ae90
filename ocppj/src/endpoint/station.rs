//! Charging station endpoint (websocket client side)

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{Core, EndpointBuilder};
use crate::config::EndpointConfig;
use crate::dispatcher::{Dispatcher, FrameWriter};
use crate::error::OcppError;
use crate::feature::Request;
use crate::transport::{build_ocpp_url, ClientEvent, ClientTransport, TransportError};

/// Called when the connection drops, with the cause if known
pub type DisconnectedHook = Arc<dyn Fn(Option<TransportError>) + Send + Sync>;

/// Called when the transport has re-established the connection
pub type ReconnectedHook = Arc<dyn Fn() + Send + Sync>;

const ERROR_CHANNEL_CAPACITY: usize = 32;

struct Inner {
    id: String,
    core: Arc<Core>,
    transport: Arc<dyn ClientTransport>,
    dispatcher: Mutex<Option<Dispatcher>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
    on_disconnected: RwLock<Option<DisconnectedHook>>,
    on_reconnected: RwLock<Option<ReconnectedHook>>,
    errors: broadcast::Sender<TransportError>,
}

/// An OCPP-J charging station
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct ChargingStation {
    inner: Arc<Inner>,
}

impl ChargingStation {
    /// Start building a station with `config`
    pub fn builder(config: EndpointConfig) -> EndpointBuilder {
        EndpointBuilder::new(config)
    }

    pub(crate) fn from_parts(id: String, core: Core, transport: Arc<dyn ClientTransport>) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                id,
                core: Arc::new(core),
                transport,
                dispatcher: Mutex::new(None),
                event_task: Mutex::new(None),
                on_disconnected: RwLock::new(None),
                on_reconnected: RwLock::new(None),
                errors,
            }),
        }
    }

    /// Station identity, sent as the last URL path segment
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn config(&self) -> &EndpointConfig {
        self.inner.core.config()
    }

    /// Actions this station knows, sorted
    pub fn actions(&self) -> Vec<&'static str> {
        self.inner.core.profiles().actions()
    }

    /// Handle inbound `R` requests from the CSMS
    pub fn on<R, F, Fut>(&self, handler: F)
    where
        R: Request,
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R::Response, OcppError>> + Send + 'static,
    {
        self.inner
            .core
            .register::<R, _, _>(move |_peer_id: String, request: R| handler(request));
    }

    pub fn on_disconnected(&self, hook: impl Fn(Option<TransportError>) + Send + Sync + 'static) {
        *self.inner.on_disconnected.write() = Some(Arc::new(hook));
    }

    pub fn on_reconnected(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.inner.on_reconnected.write() = Some(Arc::new(hook));
    }

    /// Asynchronous transport errors. Informational only.
    pub fn errors(&self) -> broadcast::Receiver<TransportError> {
        self.inner.errors.subscribe()
    }

    /// Connect to the CSMS at `url`; the station id is appended as the last
    /// path segment. Returns once the first connection is up.
    pub async fn start(&self, url: &str) -> Result<(), OcppError> {
        let dispatcher = {
            let mut slot = self.inner.dispatcher.lock();
            if slot.is_some() {
                return Err(OcppError::AlreadyStarted);
            }
            let transport = self.inner.transport.clone();
            let writer: FrameWriter = Arc::new(move |frame: &str| transport.write(frame));
            let dispatcher = Dispatcher::new(
                self.inner.id.clone(),
                self.inner.core.config().clone(),
                writer,
            );
            *slot = Some(dispatcher.clone());
            dispatcher
        };

        let url = build_ocpp_url(url, &self.inner.id);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        if let Err(err) = self.inner.transport.start(&url, events_tx).await {
            warn!("Charging station {} failed to connect to {}: {}", self.inner.id, url, err);
            self.inner.dispatcher.lock().take();
            dispatcher.close();
            return Err(err.into());
        }

        dispatcher.connected();
        info!("Charging station {} connected to {}", self.inner.id, url);

        let task = tokio::spawn(run_events(
            Arc::downgrade(&self.inner),
            dispatcher,
            events_rx,
        ));
        *self.inner.event_task.lock() = Some(task);
        Ok(())
    }

    /// Close the connection. Pending and queued requests fail with
    /// `ConnectionLost`.
    pub async fn stop(&self) {
        let dispatcher = self.inner.dispatcher.lock().take();
        let Some(dispatcher) = dispatcher else {
            return;
        };

        self.inner.transport.stop().await;
        if let Some(task) = self.inner.event_task.lock().take() {
            task.abort();
        }
        dispatcher.close();
        info!("Charging station {} stopped", self.inner.id);
    }

    pub fn is_connected(&self) -> bool {
        self.inner.transport.is_connected()
    }

    /// Send `request` to the CSMS. Returns the message id once the request
    /// is accepted; `callback` then runs exactly once with the outcome.
    /// A request failing validation is rejected here and its callback gets
    /// the same error. Other errors returned here leave the callback unrun.
    pub fn send_request<R, C>(&self, request: R, callback: C) -> Result<String, OcppError>
    where
        R: Request,
        C: FnOnce(Result<R::Response, OcppError>) + Send + 'static,
    {
        let dispatcher = self
            .inner
            .dispatcher
            .lock()
            .clone()
            .ok_or(OcppError::NotConnected)?;
        self.inner.core.send(&dispatcher, request, callback)
    }

    /// Send `request` and wait for the response
    pub async fn request<R: Request>(&self, request: R) -> Result<R::Response, OcppError> {
        let (tx, rx) = oneshot::channel();
        self.send_request(request, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| OcppError::ConnectionLost)?
    }

    /// Requests waiting behind the in-flight one
    pub fn queued_requests(&self) -> usize {
        self.inner
            .dispatcher
            .lock()
            .as_ref()
            .map_or(0, Dispatcher::queue_len)
    }
}

async fn run_events(
    inner: Weak<Inner>,
    dispatcher: Dispatcher,
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        match event {
            ClientEvent::Message(frame) => inner.core.handle_frame(&dispatcher, &frame),
            ClientEvent::Disconnected(cause) => {
                match &cause {
                    Some(err) => warn!("Charging station {} disconnected: {}", inner.id, err),
                    None => info!("Charging station {} disconnected", inner.id),
                }
                dispatcher.connection_lost();
                let hook = inner.on_disconnected.read().clone();
                if let Some(hook) = hook {
                    hook(cause);
                }
            }
            ClientEvent::Reconnected => {
                info!("Charging station {} reconnected", inner.id);
                dispatcher.connected();
                let hook = inner.on_reconnected.read().clone();
                if let Some(hook) = hook {
                    hook();
                }
            }
            ClientEvent::Error(err) => {
                warn!("Transport error on {}: {}", inner.id, err);
                let _ = inner.errors.send(err);
            }
        }
    }
}

impl std::fmt::Debug for ChargingStation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChargingStation")
            .field("id", &self.inner.id)
            .field("version", &self.inner.core.config().version)
            .finish()
    }
}
