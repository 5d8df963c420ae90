//! Features: an OCPP action paired with its typed request and response
//!
//! Payload types implement [`Request`]; the endpoint works with the
//! type-erased [`Feature`] descriptor built from it, which carries the
//! action name, the allowed initiator and the decode functions.

use std::any::Any;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::validate::{self, Violation};
use crate::version::Role;

/// Type-erased decoded payload
pub type Payload = Box<dyn Any + Send>;

/// Which side may initiate a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Initiator {
    ChargingStation,
    Csms,
    Either,
}

impl Initiator {
    /// Whether an endpoint with `role` may send this feature's request
    pub fn allows(&self, role: Role) -> bool {
        matches!(
            (self, role),
            (Initiator::Either, _)
                | (Initiator::ChargingStation, Role::ChargingStation)
                | (Initiator::Csms, Role::Csms)
        )
    }
}

/// A typed OCPP request. The response type and action name are fixed per request.
pub trait Request: Serialize + DeserializeOwned + Validate + Debug + Send + Sync + 'static {
    type Response: Serialize + DeserializeOwned + Validate + Debug + Send + Sync + 'static;

    /// Action name on the wire, e.g. `BootNotification`
    const ACTION: &'static str;

    /// Side allowed to send this request
    const INITIATOR: Initiator;
}

/// Runtime descriptor of a feature
#[derive(Clone, Copy)]
pub struct Feature {
    action: &'static str,
    initiator: Initiator,
    decode_request: fn(Value) -> Result<Payload, Violation>,
    decode_response: fn(Value) -> Result<Payload, Violation>,
}

impl Feature {
    /// Descriptor for request type `R`
    pub fn of<R: Request>() -> Self {
        Self {
            action: R::ACTION,
            initiator: R::INITIATOR,
            decode_request: decode_payload::<R>,
            decode_response: decode_payload::<R::Response>,
        }
    }

    /// Override the allowed initiator
    pub fn with_initiator(mut self, initiator: Initiator) -> Self {
        self.initiator = initiator;
        self
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn initiator(&self) -> Initiator {
        self.initiator
    }

    /// Decode and validate an inbound request payload
    pub fn decode_request(&self, payload: Value) -> Result<Payload, Violation> {
        (self.decode_request)(payload)
    }

    /// Decode and validate an inbound response payload
    pub fn decode_response(&self, payload: Value) -> Result<Payload, Violation> {
        (self.decode_response)(payload)
    }
}

impl Debug for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feature")
            .field("action", &self.action)
            .field("initiator", &self.initiator)
            .finish()
    }
}

fn decode_payload<T>(payload: Value) -> Result<Payload, Violation>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    let value: T = validate::decode(payload)?;
    Ok(Box::new(value))
}
