//! Pending request bookkeeping for one peer
//!
//! A request becomes pending just before its CALL is written and stops being
//! pending on the first of: CALLRESULT, CALLERROR, timeout, connection loss.

use std::collections::HashMap;

use serde_json::Value;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::OcppError;
use crate::feature::{Feature, Payload};

/// Invoked exactly once with the outcome of a request
pub type Completion = Box<dyn FnOnce(Result<Payload, OcppError>) + Send>;

/// An outstanding request awaiting its response
pub struct PendingEntry {
    pub message_id: String,
    pub feature: Feature,
    pub request: Value,
    pub deadline: Instant,
    pub completion: Completion,
    pub(crate) generation: u64,
    pub(crate) timer: Option<AbortHandle>,
}

impl PendingEntry {
    /// Cancel the response timer
    pub(crate) fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEntry")
            .field("message_id", &self.message_id)
            .field("action", &self.feature.action())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Pending requests of one peer, keyed by message id
#[derive(Debug, Default)]
pub struct RequestState {
    pending: HashMap<String, PendingEntry>,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a request. Fails if the id is already pending.
    pub fn add_pending(&mut self, entry: PendingEntry) -> Result<(), (OcppError, PendingEntry)> {
        if self.pending.contains_key(&entry.message_id) {
            let err = OcppError::DuplicateMessageId(entry.message_id.clone());
            return Err((err, entry));
        }
        self.pending.insert(entry.message_id.clone(), entry);
        Ok(())
    }

    /// Remove and return the request matching a response
    pub fn take_pending(&mut self, message_id: &str) -> Option<PendingEntry> {
        self.pending.remove(message_id)
    }

    pub fn get(&self, message_id: &str) -> Option<&PendingEntry> {
        self.pending.get(message_id)
    }

    /// Remove every pending request; the caller fails them
    pub fn clear_pending(&mut self) -> Vec<PendingEntry> {
        self.pending.drain().map(|(_, entry)| entry).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, message_id: &str) -> bool {
        self.pending.contains_key(message_id)
    }

    pub fn pending_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.pending.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}
