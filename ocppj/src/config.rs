//! Endpoint configuration
//!
//! Queueing, timeouts and protocol version for one endpoint. Transport
//! keepalive settings ride along in [`ClientTimeoutConfig`] and are handed
//! to the transport implementation untouched.

use std::time::Duration;

use crate::version::OcppVersion;

/// Default number of requests waiting behind the in-flight one
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default deadline for a response to an outgoing CALL
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Order in which queued requests are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueOrder {
    #[default]
    Fifo,
    Lifo,
}

/// What happens to queued requests when a connection drops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Fail every queued request with `ConnectionLost`
    #[default]
    Strict,
    /// Keep queued requests and send them after reconnecting
    Retain,
}

/// Websocket keepalive and handshake timing, consumed by transports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTimeoutConfig {
    /// Maximum time to write a frame
    pub write_wait: Duration,
    /// Time allowed between pongs before the connection is considered dead
    pub pong_wait: Duration,
    /// Interval between pings; must be shorter than `pong_wait`
    pub ping_period: Duration,
    /// Maximum duration of the websocket handshake
    pub handshake_timeout: Duration,
}

impl Default for ClientTimeoutConfig {
    fn default() -> Self {
        Self {
            write_wait: Duration::from_secs(10),
            pong_wait: Duration::from_secs(60),
            ping_period: Duration::from_secs(54),
            handshake_timeout: Duration::from_secs(30),
        }
    }
}

/// Complete endpoint configuration
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub version: OcppVersion,

    /// Requests allowed to wait behind the in-flight one, per peer
    pub queue_capacity: usize,

    /// Deadline per pending request
    pub response_timeout: Duration,

    pub queue_order: QueueOrder,

    pub reconnect_policy: ReconnectPolicy,

    pub client_timeouts: ClientTimeoutConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(OcppVersion::V201)
    }
}

impl EndpointConfig {
    pub fn new(version: OcppVersion) -> Self {
        Self {
            version,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            queue_order: QueueOrder::default(),
            reconnect_policy: ReconnectPolicy::default(),
            client_timeouts: ClientTimeoutConfig::default(),
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_queue_order(mut self, order: QueueOrder) -> Self {
        self.queue_order = order;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn with_client_timeouts(mut self, timeouts: ClientTimeoutConfig) -> Self {
        self.client_timeouts = timeouts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EndpointConfig::default();
        assert_eq!(config.version, OcppVersion::V201);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.queue_order, QueueOrder::Fifo);
        assert_eq!(config.reconnect_policy, ReconnectPolicy::Strict);
        assert!(config.client_timeouts.ping_period < config.client_timeouts.pong_wait);
    }

    #[test]
    fn test_config_builder() {
        let config = EndpointConfig::new(OcppVersion::V16)
            .with_queue_capacity(0)
            .with_response_timeout(Duration::from_millis(250))
            .with_queue_order(QueueOrder::Lifo)
            .with_reconnect_policy(ReconnectPolicy::Retain);

        assert_eq!(config.version, OcppVersion::V16);
        assert_eq!(config.queue_capacity, 0);
        assert_eq!(config.response_timeout, Duration::from_millis(250));
        assert_eq!(config.queue_order, QueueOrder::Lifo);
        assert_eq!(config.reconnect_policy, ReconnectPolicy::Retain);
    }
}
