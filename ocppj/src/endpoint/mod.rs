//! OCPP-J endpoints
//!
//! Two flavors share one core:
//! - [`ChargingStation`]: websocket client, one dispatcher
//! - [`Csms`]: websocket server, one dispatcher per connected station
//!
//! ```text
//!   inbound frame ──▶ envelope ──▶ Call ──▶ direction ──▶ feature ──▶ handler ──▶ CallResult
//!                        │                     │            │            │
//!                        │                     └────────────┴────────────┴──▶ CallError
//!                        └──▶ CallResult / CallError ──▶ dispatcher.complete()
//! ```
//!
//! Every CALLERROR this crate writes goes through [`Core::reply_error`],
//! which is the only place local errors become wire errors.
//!
//! Handlers for one peer run one at a time, in the order its CALLs arrived,
//! and each reply is written before the next handler starts. Different
//! peers are handled concurrently. CALLs rejected before reaching a handler
//! (unknown action, wrong direction, invalid payload) are answered at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::dispatcher::Dispatcher;
use crate::envelope::{Call, CallError, CallResult, OcppMessage};
use crate::error::{ErrorCode, OcppError, ProtocolError};
use crate::feature::{Feature, Request};
use crate::handler::{erase, ErasedHandler};
use crate::id::{MessageIdGenerator, UuidIdGenerator};
use crate::profile::{Profile, ProfileSet};
use crate::request_state::Completion;
use crate::transport::{ClientTransport, ServerTransport};
use crate::validate;
use crate::version::Role;

mod csms;
mod station;

pub use csms::{Csms, PeerHook};
pub use station::{ChargingStation, DisconnectedHook, ReconnectedHook};

/// State shared by both endpoint flavors
pub(crate) struct Core {
    role: Role,
    config: EndpointConfig,
    profiles: ProfileSet,
    handlers: RwLock<HashMap<&'static str, ErasedHandler>>,
    ids: Arc<dyn MessageIdGenerator>,
}

impl Core {
    fn new(
        role: Role,
        config: EndpointConfig,
        profiles: ProfileSet,
        ids: Arc<dyn MessageIdGenerator>,
    ) -> Self {
        Self {
            role,
            config,
            profiles,
            handlers: RwLock::new(HashMap::new()),
            ids,
        }
    }

    pub(crate) fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub(crate) fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Error code used for malformed frames in this endpoint's version
    pub(crate) fn format_code(&self) -> ErrorCode {
        self.config.version.format_violation()
    }

    fn local_name(&self) -> &'static str {
        self.config.version.role_name(self.role)
    }

    /// Register the handler for inbound `R` requests, replacing any previous one
    pub(crate) fn register<R, F, Fut>(&self, handler: F)
    where
        R: Request,
        F: Fn(String, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R::Response, OcppError>> + Send + 'static,
    {
        match self.profiles.feature(R::ACTION) {
            None => warn!("Handler for {} registered, but no profile provides it", R::ACTION),
            Some(feature) if !feature.initiator().allows(self.role.peer()) => warn!(
                "Handler for {} registered, but a {} never receives it",
                R::ACTION,
                self.local_name()
            ),
            Some(_) => debug!("Registered handler for {}", R::ACTION),
        }
        self.handlers.write().insert(R::ACTION, erase::<R, F, Fut>(handler));
    }

    /// Resolve and direction-check an outbound request
    fn resolve<R: Request>(&self) -> Result<Feature, OcppError> {
        let feature = self
            .profiles
            .feature(R::ACTION)
            .copied()
            .ok_or_else(|| OcppError::UnknownAction(R::ACTION.to_string()))?;

        if !feature.initiator().allows(self.role) {
            return Err(OcppError::UnsupportedAction {
                action: R::ACTION.to_string(),
                side: self.local_name(),
            });
        }
        Ok(feature)
    }

    /// Validate `request` and hand it to `dispatcher`. Returns the message id.
    ///
    /// A validation failure is returned and also delivered to `callback`.
    /// Routing errors and a full queue are only returned.
    pub(crate) fn send<R, C>(
        &self,
        dispatcher: &Dispatcher,
        request: R,
        callback: C,
    ) -> Result<String, OcppError>
    where
        R: Request,
        C: FnOnce(Result<R::Response, OcppError>) + Send + 'static,
    {
        let feature = self.resolve::<R>()?;

        if let Err(violation) = validate::validate(&request) {
            let violation = violation.prefixed(&format!("{}Request", R::ACTION));
            debug!("Outbound {} failed validation: {}", R::ACTION, violation);
            callback(Err(OcppError::Validation(violation.clone())));
            return Err(OcppError::Validation(violation));
        }

        let payload = serde_json::to_value(&request)?;
        let message_id = self.ids.next_id();
        dispatcher.send(
            message_id.clone(),
            feature,
            payload,
            typed_completion::<R, C>(callback),
        )?;
        Ok(message_id)
    }

    /// Process one inbound text frame from the peer served by `dispatcher`
    pub(crate) fn handle_frame(self: &Arc<Self>, dispatcher: &Dispatcher, frame: &str) {
        debug!("Received from {}: {}", dispatcher.peer_id(), frame);

        match OcppMessage::parse(frame) {
            Ok(OcppMessage::Call(call)) => self.handle_call(dispatcher, call),
            Ok(OcppMessage::CallResult(result)) => {
                dispatcher.complete(&result.message_id, Ok(result.payload));
            }
            Ok(OcppMessage::CallError(error)) => {
                debug!(
                    "CallError {} from {}: {} {}",
                    error.message_id,
                    dispatcher.peer_id(),
                    error.error_code,
                    error.error_description
                );
                dispatcher.complete(&error.message_id, Err(error.to_protocol_error()));
            }
            Err(err) => {
                warn!("Invalid frame from {}: {}", dispatcher.peer_id(), err);
                let message_id = err.message_id.unwrap_or_default();
                let error = ProtocolError::new(self.format_code(), err.description);
                self.reply_error(dispatcher, &message_id, error.into());
            }
        }
    }

    fn handle_call(self: &Arc<Self>, dispatcher: &Dispatcher, call: Call) {
        let Call {
            message_id,
            action,
            payload,
        } = call;

        let Some(feature) = self.profiles.feature(&action).copied() else {
            let err = OcppError::protocol(ErrorCode::NotImplemented, format!("unknown action {action}"));
            return self.reply_error(dispatcher, &message_id, err);
        };

        if !feature.initiator().allows(self.role.peer()) {
            let description = format!("unsupported action {} on {}", action, self.local_name());
            let err = OcppError::protocol(ErrorCode::NotSupported, description);
            return self.reply_error(dispatcher, &message_id, err);
        }

        let Some(handler) = self.handlers.read().get(feature.action()).cloned() else {
            let err = OcppError::protocol(
                ErrorCode::NotSupported,
                format!("no handler for action {action} on {}", self.local_name()),
            );
            return self.reply_error(dispatcher, &message_id, err);
        };

        let request = match feature.decode_request(payload) {
            Ok(request) => request,
            Err(violation) => {
                let err = OcppError::Validation(violation.prefixed("Call.Payload"));
                return self.reply_error(dispatcher, &message_id, err);
            }
        };

        let core = Arc::clone(self);
        let dispatcher = dispatcher.clone();
        let (previous, done) = dispatcher.handler_turn();
        tokio::spawn(async move {
            if let Some(previous) = previous {
                // resolves with an error once the earlier handler drops its sender
                let _ = previous.await;
            }
            let peer_id = dispatcher.peer_id().to_string();
            let outcome = match tokio::spawn(handler(peer_id, request)).await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(OcppError::application(format!(
                    "handler for {action} failed: {join_err}"
                ))),
            };

            match outcome {
                Ok(payload) => {
                    let frame = OcppMessage::CallResult(CallResult {
                        message_id: message_id.clone(),
                        payload,
                    })
                    .to_text();
                    if let Err(err) = dispatcher.reply(&frame) {
                        warn!("Failed to send response {} to {}: {}", message_id, dispatcher.peer_id(), err);
                    }
                }
                Err(err) => core.reply_error(&dispatcher, &message_id, err),
            }
            drop(done);
        });
    }

    /// Convert a local error to its wire form and send it as a CALLERROR
    pub(crate) fn reply_error(&self, dispatcher: &Dispatcher, message_id: &str, err: OcppError) {
        let error = match err {
            OcppError::Protocol(error) => error,
            OcppError::Validation(violation) => {
                ProtocolError::new(violation.code(self.format_code()), violation.to_string())
            }
            other => ProtocolError::new(ErrorCode::InternalError, other.to_string()),
        };

        debug!(
            "Replying to {} from {} with {}",
            message_id,
            dispatcher.peer_id(),
            error
        );
        let frame = OcppMessage::CallError(CallError::from_protocol_error(message_id, error)).to_text();
        if let Err(err) = dispatcher.reply(&frame) {
            warn!("Failed to send error {} to {}: {}", message_id, dispatcher.peer_id(), err);
        }
    }
}

/// Adapt a typed callback to the dispatcher's completion
fn typed_completion<R, C>(callback: C) -> Completion
where
    R: Request,
    C: FnOnce(Result<R::Response, OcppError>) + Send + 'static,
{
    Box::new(move |result| {
        let result = result.and_then(|payload| {
            payload
                .downcast::<R::Response>()
                .map(|response| *response)
                .map_err(|_| {
                    OcppError::application(format!("unexpected response type for {}", R::ACTION))
                })
        });
        callback(result);
    })
}

/// Builds a [`ChargingStation`] or a [`Csms`]
pub struct EndpointBuilder {
    config: EndpointConfig,
    profiles: Vec<Profile>,
    ids: Arc<dyn MessageIdGenerator>,
}

impl Default for EndpointBuilder {
    fn default() -> Self {
        Self::new(EndpointConfig::default())
    }
}

impl EndpointBuilder {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            profiles: Vec::new(),
            ids: Arc::new(UuidIdGenerator),
        }
    }

    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = Profile>) -> Self {
        self.profiles.extend(profiles);
        self
    }

    pub fn with_id_generator(mut self, ids: impl MessageIdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    fn core(self, role: Role) -> Result<Core, OcppError> {
        let profiles = ProfileSet::new(self.profiles)?;
        Ok(Core::new(role, self.config, profiles, self.ids))
    }

    /// Charging station `id` connecting through `transport`.
    /// Fails if two profiles provide the same action.
    pub fn build_station(
        self,
        id: impl Into<String>,
        transport: impl ClientTransport,
    ) -> Result<ChargingStation, OcppError> {
        let core = self.core(Role::ChargingStation)?;
        Ok(ChargingStation::from_parts(id.into(), core, Arc::new(transport)))
    }

    /// CSMS accepting stations through `transport`.
    /// Fails if two profiles provide the same action.
    pub fn build_csms(self, transport: impl ServerTransport) -> Result<Csms, OcppError> {
        let core = self.core(Role::Csms)?;
        Ok(Csms::from_parts(core, Arc::new(transport)))
    }
}
