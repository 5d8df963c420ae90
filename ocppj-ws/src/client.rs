//! Station side WebSocket transport
//!
//! Handles:
//! - WebSocket connection with the OCPP subprotocol of the configured version
//! - Keepalive pings every `ping_period`, read deadline of `pong_wait`
//! - Automatic reconnection with exponential backoff

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use ocppj::transport::{ClientEvent, ClientTransport};
use ocppj::TransportError;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use crate::config::WsClientConfig;
use crate::{read_loop, write_loop};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Inner {
    config: WsClientConfig,
    outbox: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    connected: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// WebSocket client for one charging station
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<Inner>,
}

impl Default for WsClient {
    fn default() -> Self {
        Self::new(WsClientConfig::default())
    }
}

impl WsClient {
    pub fn new(config: WsClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                outbox: Mutex::new(None),
                connected: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &WsClientConfig {
        &self.inner.config
    }
}

#[async_trait]
impl ClientTransport for WsClient {
    async fn start(
        &self,
        url: &str,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<(), TransportError> {
        info!("Connecting to CSMS: {}", url);
        let stream = self.inner.connect(url).await?;
        let source = self.inner.attach(stream);
        info!("WebSocket connected to {}", url);

        let task = tokio::spawn(run(self.inner.clone(), url.to_string(), source, events));
        if let Some(previous) = self.inner.task.lock().replace(task) {
            previous.abort();
        }
        Ok(())
    }

    async fn stop(&self) {
        if let Some(task) = self.inner.task.lock().take() {
            task.abort();
        }
        self.inner.detach();
        info!("WebSocket client stopped");
    }

    fn write(&self, frame: &str) -> Result<(), TransportError> {
        let outbox = self.inner.outbox.lock();
        let outbox = outbox.as_ref().ok_or(TransportError::Closed)?;
        outbox
            .send(Message::Text(frame.to_string()))
            .map_err(|_| TransportError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }
}

impl Inner {
    async fn connect(&self, url: &str) -> Result<WsStream, TransportError> {
        let subprotocol = self.config.version.subprotocol();
        let mut request = url
            .into_client_request()
            .map_err(|err| TransportError::InvalidUrl(format!("{url}: {err}")))?;
        request.headers_mut().insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(subprotocol),
        );

        let handshake = connect_async_with_config(request, Some(self.config.websocket()), false);
        let (stream, response) = timeout(self.config.timeouts.handshake_timeout, handshake)
            .await
            .map_err(|_| TransportError::Handshake("handshake timed out".to_string()))?
            .map_err(handshake_error)?;

        // Verify subprotocol
        let accepted = response
            .headers()
            .get(header::SEC_WEBSOCKET_PROTOCOL)
            .and_then(|value| value.to_str().ok());
        if accepted != Some(subprotocol) {
            return Err(TransportError::Handshake(format!(
                "CSMS did not accept subprotocol {subprotocol}, got {accepted:?}"
            )));
        }
        Ok(stream)
    }

    /// Install a fresh connection: spawn its writer and hand back the read half
    fn attach(&self, stream: WsStream) -> SplitStream<WsStream> {
        let (sink, source) = stream.split();
        let (outbox, queue) = mpsc::unbounded_channel();
        let timeouts = &self.config.timeouts;
        tokio::spawn(write_loop(
            sink,
            queue,
            timeouts.write_wait,
            Some(timeouts.ping_period),
        ));

        *self.outbox.lock() = Some(outbox);
        self.connected.store(true, Ordering::SeqCst);
        source
    }

    fn detach(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.outbox.lock().take();
    }
}

/// Run the connection until it drops, then reconnect with backoff
async fn run(
    inner: Arc<Inner>,
    url: String,
    mut source: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    loop {
        let reason = read_loop(&mut source, inner.config.timeouts.pong_wait, |frame| {
            let _ = events.send(ClientEvent::Message(frame));
        })
        .await;

        inner.detach();
        match &reason {
            Some(err) => warn!(%err, "Connection to CSMS lost"),
            None => info!("WebSocket closed by server"),
        }
        if events.send(ClientEvent::Disconnected(reason)).is_err() || !inner.config.auto_reconnect {
            return;
        }

        // Exponential backoff
        let mut delay = inner.config.reconnect_delay;
        source = loop {
            info!("Reconnecting in {:?}", delay);
            tokio::time::sleep(delay).await;
            if events.is_closed() {
                return;
            }

            match inner.connect(&url).await {
                Ok(stream) => break inner.attach(stream),
                Err(err) => {
                    warn!(%err, "Reconnect failed");
                    let _ = events.send(ClientEvent::Error(err));
                    delay = inner.config.next_delay(delay);
                }
            }
        };

        info!("WebSocket reconnected to {}", url);
        let _ = events.send(ClientEvent::Reconnected);
    }
}

fn handshake_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::Http(response) => TransportError::Handshake(format!(
            "CSMS refused the upgrade with {}",
            response.status()
        )),
        tungstenite::Error::Url(err) => TransportError::InvalidUrl(err.to_string()),
        tungstenite::Error::Io(err) => TransportError::Io(err.to_string()),
        other => TransportError::Handshake(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_before_start_fails() {
        let client = WsClient::default();
        assert!(!client.is_connected());
        assert_eq!(client.write("[2,\"1\",\"Heartbeat\",{}]"), Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = WsClient::default();
        let (events, _rx) = mpsc::unbounded_channel();
        let err = client.start("not a url", events).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = WsClient::default();
        let (events, _rx) = mpsc::unbounded_channel();
        let err = client
            .start(&format!("ws://127.0.0.1:{port}/ocpp/CS001"), events)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert!(!client.is_connected());
    }
}
