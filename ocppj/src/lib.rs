//! # OCPP-J
//!
//! Runs the OCPP-J (1.6J and 2.0.1) request/response protocol between a
//! CSMS and charging stations on top of any websocket-like transport.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────── application ─────────────────────────┐
//!   │   on::<R>(handler)                    send_request / request │
//!   └───────┬───────────────────────────────────────▲──────┬───────┘
//!           │                                       │      │
//!   ┌───────▼──────── Endpoint (ChargingStation | Csms) ───┼───────┐
//!   │  direction table · profiles · validation · CallError │       │
//!   └───────▲───────────────────────────────┬──────────────▼───────┘
//!           │                               │   Dispatcher (per peer)
//!           │ envelope codec                │   queue · pending · timeout
//!   ┌───────┴───────────────────────────────▼──────────────────────┐
//!   │        Transport (ServerTransport | ClientTransport)         │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let station = ChargingStation::builder(EndpointConfig::new(OcppVersion::V201))
//!     .with_profile(core_profile())
//!     .build_station("CS001", transport)?;
//! station.start("ws://localhost:8887/ocpp").await?;
//! let response = station.request(HeartbeatRequest {}).await?;
//! ```

pub mod config;
pub mod datetime;
pub mod dispatcher;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod feature;
mod handler;
pub mod id;
pub mod profile;
pub mod queue;
pub mod request_state;
pub mod transport;
pub mod validate;
pub mod version;

pub use config::{ClientTimeoutConfig, EndpointConfig, QueueOrder, ReconnectPolicy};
pub use datetime::DateTime;
pub use endpoint::{ChargingStation, Csms, EndpointBuilder};
pub use envelope::{Call, CallError, CallResult, EnvelopeError, MessageType, OcppMessage};
pub use error::{ErrorCode, OcppError, ProtocolError};
pub use feature::{Feature, Initiator, Request};
pub use id::{FixedIdGenerator, MessageIdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use profile::{Profile, ProfileSet};
pub use transport::{ClientTransport, ServerTransport, TransportError};
pub use validate::{OcppEnum, Violation};
pub use version::{OcppVersion, Role};
