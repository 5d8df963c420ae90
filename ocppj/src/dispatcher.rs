//! Per-peer request dispatcher
//!
//! Keeps at most one CALL in flight per peer:
//!
//! ```text
//!            send()                       response / timeout
//!   Idle ───────────────▶ InFlight ─────────────────────────┐
//!    ▲                     │    ▲                            │
//!    │                send()│    │ queue non-empty: pop+write│
//!    │                     ▼    │                            │
//!    │                   Queue ─┘◀───────────────────────────┘
//!    └──────────── queue empty ◀────────────────────────────┘
//! ```
//!
//! Every state transition happens under one mutex. Frames are written
//! while holding it, so CALLs reach the transport in acceptance order.
//! Callbacks are not run under the lock: they are handed to a completion
//! task and run there in the order the requests completed. Once that task
//! is gone (runtime shutdown) they run on the calling thread after the lock
//! is released.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{EndpointConfig, ReconnectPolicy};
use crate::envelope::{Call, OcppMessage};
use crate::error::{OcppError, ProtocolError};
use crate::feature::{Feature, Payload};
use crate::queue::{new_queue, QueuedRequest, RequestQueue};
use crate::request_state::{Completion, PendingEntry, RequestState};
use crate::transport::TransportError;

/// Writes one text frame to the peer
pub type FrameWriter = Arc<dyn Fn(&str) -> Result<(), TransportError> + Send + Sync>;

type Job = Box<dyn FnOnce() + Send>;

struct State {
    queue: Box<dyn RequestQueue>,
    requests: RequestState,
    connected: bool,
    closed: bool,
    next_generation: u64,
    /// Completions the completion task could not take, run after unlock
    orphaned: Vec<Job>,
}

struct Shared {
    peer_id: String,
    config: EndpointConfig,
    state: Mutex<State>,
    writer: FrameWriter,
    completions: mpsc::UnboundedSender<Job>,
    runtime: Handle,
    /// Resolves once the latest inbound CALL has been answered
    last_handler: Mutex<Option<oneshot::Receiver<()>>>,
}

/// Outbound request pipeline for one peer
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    /// Create a dispatcher for `peer_id`. Must be called within a tokio runtime.
    /// The dispatcher starts disconnected.
    pub fn new(peer_id: impl Into<String>, config: EndpointConfig, writer: FrameWriter) -> Self {
        let (completions, mut rx) = mpsc::unbounded_channel::<Job>();
        let runtime = Handle::current();

        runtime.spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });

        let state = State {
            queue: new_queue(config.queue_order, config.queue_capacity),
            requests: RequestState::new(),
            connected: false,
            closed: false,
            next_generation: 0,
            orphaned: Vec::new(),
        };

        Self {
            shared: Arc::new(Shared {
                peer_id: peer_id.into(),
                config,
                state: Mutex::new(state),
                writer,
                completions,
                runtime,
                last_handler: Mutex::new(None),
            }),
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.shared.peer_id
    }

    /// Accept a request for sending. Errors returned here are final and the
    /// completion is dropped without being called; otherwise the completion
    /// runs exactly once with the outcome.
    pub fn send(
        &self,
        message_id: String,
        feature: Feature,
        payload: Value,
        completion: Completion,
    ) -> Result<(), OcppError> {
        let mut state = self.shared.state.lock();

        if state.closed {
            return Err(OcppError::NotConnected);
        }
        if state.requests.is_pending(&message_id) || state.queue.contains(&message_id) {
            return Err(OcppError::DuplicateMessageId(message_id));
        }

        let request = QueuedRequest {
            message_id,
            feature,
            payload,
            completion,
        };

        let can_write = state.connected && !state.requests.has_pending() && state.queue.is_empty();
        if can_write {
            return self
                .write_call(&mut state, request)
                .map_err(|(err, _completion)| err);
        }

        if !state.connected && self.shared.config.reconnect_policy == ReconnectPolicy::Strict {
            return Err(OcppError::NotConnected);
        }

        let capacity = state.queue.capacity();
        match state.queue.push(request) {
            Ok(()) => {
                debug!(
                    "Queued request for {} ({} waiting)",
                    self.shared.peer_id,
                    state.queue.len()
                );
                Ok(())
            }
            Err(rejected) => {
                debug!(
                    "Queue full for {}, rejecting {}",
                    self.shared.peer_id, rejected.message_id
                );
                Err(OcppError::QueueFull(capacity))
            }
        }
    }

    /// Resolve the pending request `message_id` with a response payload or a
    /// CALLERROR. Returns false when nothing was pending under that id.
    pub fn complete(&self, message_id: &str, outcome: Result<Value, ProtocolError>) -> bool {
        let mut state = self.shared.state.lock();

        let Some(mut entry) = state.requests.take_pending(message_id) else {
            debug!(
                "Dropping response {} from {}: no pending request",
                message_id, self.shared.peer_id
            );
            return false;
        };
        entry.disarm();

        let result = match outcome {
            Ok(payload) => entry
                .feature
                .decode_response(payload)
                .map_err(|violation| OcppError::Validation(violation.prefixed("CallResult.Payload"))),
            Err(err) => Err(OcppError::Protocol(err)),
        };

        self.finish(&mut state, entry.completion, result);
        self.pump(&mut state);
        self.release(state);
        true
    }

    /// The connection to the peer is (re-)established
    pub fn connected(&self) {
        let mut state = self.shared.state.lock();
        if state.closed {
            return;
        }
        state.connected = true;
        self.pump(&mut state);
        self.release(state);
    }

    /// The connection dropped: fail the in-flight request and, under the
    /// strict policy, every queued one.
    pub fn connection_lost(&self) {
        let mut state = self.shared.state.lock();
        state.connected = false;
        self.fail_pending(&mut state);

        if self.shared.config.reconnect_policy == ReconnectPolicy::Strict {
            self.fail_queued(&mut state);
        }
        self.release(state);
    }

    /// Final shutdown; fails everything regardless of policy
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        state.connected = false;
        self.fail_pending(&mut state);
        self.fail_queued(&mut state);
        self.release(state);
    }

    /// Take the next place in this peer's inbound line. Await the receiver
    /// (if any) before handling the CALL; drop the sender once it is answered.
    pub(crate) fn handler_turn(&self) -> (Option<oneshot::Receiver<()>>, oneshot::Sender<()>) {
        let (done, next) = oneshot::channel();
        let previous = self.shared.last_handler.lock().replace(next);
        (previous, done)
    }

    /// Write a CALLRESULT or CALLERROR frame. Responses bypass the queue.
    pub fn reply(&self, frame: &str) -> Result<(), TransportError> {
        debug!("Sending to {}: {}", self.shared.peer_id, frame);
        (self.shared.writer)(frame)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.state.lock().connected
    }

    pub fn has_pending(&self) -> bool {
        self.shared.state.lock().requests.has_pending()
    }

    /// Id of the request currently in flight
    pub fn pending_id(&self) -> Option<String> {
        self.shared.state.lock().requests.pending_ids().into_iter().next()
    }

    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Make `request` the in-flight request and write its CALL
    fn write_call(
        &self,
        state: &mut State,
        request: QueuedRequest,
    ) -> Result<(), (OcppError, Completion)> {
        let QueuedRequest {
            message_id,
            feature,
            payload,
            completion,
        } = request;

        let frame = OcppMessage::Call(Call {
            message_id: message_id.clone(),
            action: feature.action().to_string(),
            payload: payload.clone(),
        })
        .to_text();

        let generation = state.next_generation;
        state.next_generation += 1;

        let deadline = Instant::now() + self.shared.config.response_timeout;
        let timer = self.arm_timer(message_id.clone(), generation, deadline);

        let entry = PendingEntry {
            message_id: message_id.clone(),
            feature,
            request: payload,
            deadline,
            completion,
            generation,
            timer: Some(timer),
        };
        if let Err((err, mut entry)) = state.requests.add_pending(entry) {
            entry.disarm();
            return Err((err, entry.completion));
        }

        debug!("Sending to {}: {}", self.shared.peer_id, frame);
        if let Err(err) = (self.shared.writer)(&frame) {
            warn!("Failed to write {} to {}: {}", message_id, self.shared.peer_id, err);
            if let Some(mut entry) = state.requests.take_pending(&message_id) {
                entry.disarm();
                return Err((OcppError::Transport(err), entry.completion));
            }
        }
        Ok(())
    }

    fn arm_timer(&self, message_id: String, generation: u64, deadline: Instant) -> tokio::task::AbortHandle {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        self.shared
            .runtime
            .spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(shared) = weak.upgrade() {
                    Dispatcher { shared }.expire(&message_id, generation);
                }
            })
            .abort_handle()
    }

    fn expire(&self, message_id: &str, generation: u64) {
        let mut state = self.shared.state.lock();

        let current = state
            .requests
            .get(message_id)
            .is_some_and(|entry| entry.generation == generation);
        if !current {
            return;
        }

        if let Some(entry) = state.requests.take_pending(message_id) {
            warn!(
                "Request {} ({}) to {} timed out",
                message_id,
                entry.feature.action(),
                self.shared.peer_id
            );
            self.finish(&mut state, entry.completion, Err(OcppError::Timeout(message_id.to_string())));
        }
        self.pump(&mut state);
        self.release(state);
    }

    /// Write queued requests until one is in flight or the queue is empty
    fn pump(&self, state: &mut State) {
        if !state.connected || state.closed || state.requests.has_pending() {
            return;
        }
        while let Some(next) = state.queue.pop() {
            match self.write_call(state, next) {
                Ok(()) => return,
                Err((err, completion)) => self.finish(state, completion, Err(err)),
            }
        }
    }

    fn fail_pending(&self, state: &mut State) {
        for mut entry in state.requests.clear_pending() {
            entry.disarm();
            debug!("Cancelling {} to {}: connection lost", entry.message_id, self.shared.peer_id);
            self.finish(state, entry.completion, Err(OcppError::ConnectionLost));
        }
    }

    fn fail_queued(&self, state: &mut State) {
        for request in state.queue.drain() {
            self.finish(state, request.completion, Err(OcppError::ConnectionLost));
        }
    }

    fn finish(&self, state: &mut State, completion: Completion, result: Result<Payload, OcppError>) {
        let job: Job = Box::new(move || completion(result));
        if let Err(mpsc::error::SendError(job)) = self.shared.completions.send(job) {
            // runtime is shutting down
            state.orphaned.push(job);
        }
    }

    /// Unlock, then run whatever `finish` could not hand off
    fn release(&self, mut state: MutexGuard<'_, State>) {
        let orphaned = std::mem::take(&mut state.orphaned);
        drop(state);
        for job in orphaned {
            job();
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("peer_id", &self.shared.peer_id)
            .finish()
    }
}
