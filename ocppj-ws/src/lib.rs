//! # OCPP-J over WebSocket
//!
//! [`WsServer`] and [`WsClient`] implement the `ocppj` transport traits on
//! top of `tokio-tungstenite`.
//!
//! ```text
//!   station                                   CSMS
//!   WsClient ──── ws://host/<path>/<id> ────▶ WsServer
//!     │  Sec-WebSocket-Protocol: ocpp2.0.1      │  check subprotocol
//!     │                                         │  check_peer(request)
//!     │  ping every ping_period                 │  one writer task per peer
//!     │  reconnect with backoff                 │
//! ```
//!
//! Both sides read with a deadline of `pong_wait`; any inbound frame
//! (including pongs) moves the deadline forward.

pub mod client;
pub mod config;
pub mod server;

pub use client::WsClient;
pub use config::{WsClientConfig, WsServerConfig};
pub use server::WsServer;

use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use ocppj::{OcppVersion, TransportError};
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant, Interval};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, warn};

pub(crate) fn ws_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed
        }
        tungstenite::Error::Io(err) => TransportError::Io(err.to_string()),
        other => TransportError::WebSocket(other.to_string()),
    }
}

/// Forward text frames to `on_text` until the peer closes, the socket
/// fails or nothing arrives within `pong_wait`. Returns the failure, if any.
pub(crate) async fn read_loop<S>(
    source: &mut S,
    pong_wait: Duration,
    mut on_text: impl FnMut(String),
) -> Option<TransportError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match timeout(pong_wait, source.next()).await {
            Err(_) => {
                return Some(TransportError::Io(format!(
                    "no frame received within {pong_wait:?}"
                )))
            }
            Ok(None) => return None,
            Ok(Some(Err(err))) => {
                return match ws_error(err) {
                    TransportError::Closed => None,
                    other => Some(other),
                }
            }
            Ok(Some(Ok(Message::Text(text)))) => on_text(text),
            Ok(Some(Ok(Message::Close(frame)))) => {
                debug!(?frame, "Close frame received");
                return None;
            }
            // pings are answered by tungstenite; pongs only move the deadline
            Ok(Some(Ok(_))) => {}
        }
    }
}

/// Drain `outbox` into the socket, pinging every `ping_period`. Sends a
/// close frame once every sender of `outbox` is gone.
pub(crate) async fn write_loop<S>(
    mut sink: S,
    mut outbox: mpsc::UnboundedReceiver<Message>,
    write_wait: Duration,
    ping_period: Option<Duration>,
) where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut pings = ping_period.map(|period| tokio::time::interval_at(Instant::now() + period, period));

    loop {
        let message = tokio::select! {
            message = outbox.recv() => match message {
                Some(message) => message,
                None => break,
            },
            _ = next_ping(&mut pings) => Message::Ping(Vec::new()),
        };

        match timeout(write_wait, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(%err, "Write failed");
                return;
            }
            Err(_) => {
                warn!("Write deadline of {:?} exceeded", write_wait);
                return;
            }
        }
    }

    let _ = timeout(write_wait, sink.send(Message::Close(None))).await;
}

async fn next_ping(pings: &mut Option<Interval>) {
    match pings {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Pick the first of `supported` (in preference order) that the client
/// offered in its comma separated `Sec-WebSocket-Protocol` header
pub fn negotiate(supported: &[OcppVersion], offered: &str) -> Option<OcppVersion> {
    let offered: Vec<&str> = offered.split(',').map(str::trim).collect();
    supported
        .iter()
        .copied()
        .find(|version| offered.contains(&version.subprotocol()))
}
