//! Transport configuration

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use ocppj::{ClientTimeoutConfig, EndpointConfig, OcppVersion};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

/// Largest accepted text frame
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Server side settings
///
/// The default matches `EndpointConfig::default()` and accepts OCPP 2.0.1
/// only. An endpoint speaks a single version, so build this with
/// [`WsServerConfig::for_endpoint`] for any other endpoint configuration.
#[derive(Debug, Clone)]
pub struct WsServerConfig {
    /// Address to bind; the port comes from `ServerTransport::start`
    pub bind_address: IpAddr,
    /// Accepted versions, most preferred first
    pub versions: Vec<OcppVersion>,
    /// `write_wait`, `pong_wait` and `handshake_timeout` apply per connection
    pub timeouts: ClientTimeoutConfig,
    /// Ping stations on `timeouts.ping_period` as well
    pub ping_clients: bool,
    pub max_message_size: usize,
}

impl Default for WsServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            versions: vec![EndpointConfig::default().version],
            timeouts: ClientTimeoutConfig::default(),
            ping_clients: false,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl WsServerConfig {
    /// Accept only the endpoint's version, with its timeouts
    pub fn for_endpoint(config: &EndpointConfig) -> Self {
        Self {
            versions: vec![config.version],
            timeouts: config.client_timeouts.clone(),
            ..Default::default()
        }
    }

    pub fn with_bind_address(mut self, address: IpAddr) -> Self {
        self.bind_address = address;
        self
    }

    /// Offer more subprotocols than the endpoint speaks. Only useful with a
    /// server that routes peers to endpoints by negotiated version.
    pub fn with_versions(mut self, versions: Vec<OcppVersion>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_timeouts(mut self, timeouts: ClientTimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_client_pings(mut self, enabled: bool) -> Self {
        self.ping_clients = enabled;
        self
    }

    pub(crate) fn websocket(&self) -> WebSocketConfig {
        websocket_config(self.max_message_size)
    }
}

/// Station side settings
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    pub version: OcppVersion,
    pub timeouts: ClientTimeoutConfig,
    pub max_message_size: usize,
    /// Keep reconnecting after the connection drops
    pub auto_reconnect: bool,
    /// Reconnect delay (initial)
    pub reconnect_delay: Duration,
    /// Maximum reconnect delay
    pub max_reconnect_delay: Duration,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            version: OcppVersion::V201,
            timeouts: ClientTimeoutConfig::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            auto_reconnect: true,
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_delay: Duration::from_secs(300),
        }
    }
}

impl WsClientConfig {
    /// Version and timeouts taken from the endpoint configuration
    pub fn for_endpoint(config: &EndpointConfig) -> Self {
        Self {
            version: config.version,
            timeouts: config.client_timeouts.clone(),
            ..Default::default()
        }
    }

    pub fn with_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_reconnect_delay(mut self, initial: Duration, max: Duration) -> Self {
        self.reconnect_delay = initial;
        self.max_reconnect_delay = max;
        self
    }

    pub(crate) fn websocket(&self) -> WebSocketConfig {
        websocket_config(self.max_message_size)
    }

    /// Delay before the reconnect attempt following one that waited `previous`
    pub(crate) fn next_delay(&self, previous: Duration) -> Duration {
        std::cmp::min(previous * 2, self.max_reconnect_delay)
    }
}

fn websocket_config(max_message_size: usize) -> WebSocketConfig {
    WebSocketConfig {
        max_message_size: Some(max_message_size),
        max_frame_size: Some(max_message_size),
        ..Default::default()
    }
}
