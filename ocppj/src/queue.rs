//! Outbound request queues
//!
//! Requests wait here while another request to the same peer is in flight.
//! Overflow is reported back to the caller; nothing is dropped silently.

use std::collections::VecDeque;

use serde_json::Value;

use crate::config::QueueOrder;
use crate::feature::Feature;
use crate::request_state::Completion;

/// A request accepted but not yet written
pub struct QueuedRequest {
    pub message_id: String,
    pub feature: Feature,
    pub payload: Value,
    pub completion: Completion,
}

impl std::fmt::Debug for QueuedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedRequest")
            .field("message_id", &self.message_id)
            .field("action", &self.feature.action())
            .finish()
    }
}

/// Bounded buffer of waiting requests
pub trait RequestQueue: Send {
    /// Add a request; hands it back when the queue is full
    fn push(&mut self, request: QueuedRequest) -> Result<(), QueuedRequest>;

    /// Next request to send
    fn pop(&mut self) -> Option<QueuedRequest>;

    /// Remove every waiting request
    fn drain(&mut self) -> Vec<QueuedRequest>;

    fn contains(&self, message_id: &str) -> bool;

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

/// First in, first out (default)
#[derive(Debug)]
pub struct FifoQueue {
    items: VecDeque<QueuedRequest>,
    capacity: usize,
}

impl FifoQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
}

impl RequestQueue for FifoQueue {
    fn push(&mut self, request: QueuedRequest) -> Result<(), QueuedRequest> {
        if self.is_full() {
            return Err(request);
        }
        self.items.push_back(request);
        Ok(())
    }

    fn pop(&mut self) -> Option<QueuedRequest> {
        self.items.pop_front()
    }

    fn drain(&mut self) -> Vec<QueuedRequest> {
        self.items.drain(..).collect()
    }

    fn contains(&self, message_id: &str) -> bool {
        self.items.iter().any(|r| r.message_id == message_id)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Last in, first out
#[derive(Debug)]
pub struct LifoQueue {
    items: Vec<QueuedRequest>,
    capacity: usize,
}

impl LifoQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }
}

impl RequestQueue for LifoQueue {
    fn push(&mut self, request: QueuedRequest) -> Result<(), QueuedRequest> {
        if self.is_full() {
            return Err(request);
        }
        self.items.push(request);
        Ok(())
    }

    fn pop(&mut self) -> Option<QueuedRequest> {
        self.items.pop()
    }

    fn drain(&mut self) -> Vec<QueuedRequest> {
        self.items.drain(..).rev().collect()
    }

    fn contains(&self, message_id: &str) -> bool {
        self.items.iter().any(|r| r.message_id == message_id)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Queue implementation for a configured order
pub fn new_queue(order: QueueOrder, capacity: usize) -> Box<dyn RequestQueue> {
    match order {
        QueueOrder::Fifo => Box::new(FifoQueue::new(capacity)),
        QueueOrder::Lifo => Box::new(LifoQueue::new(capacity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Initiator, Request};
    use serde::{Deserialize, Serialize};
    use validator::Validate;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct HeartbeatRequest {}

    impl Request for HeartbeatRequest {
        type Response = HeartbeatRequest;
        const ACTION: &'static str = "Heartbeat";
        const INITIATOR: Initiator = Initiator::ChargingStation;
    }

    fn request(id: &str) -> QueuedRequest {
        QueuedRequest {
            message_id: id.to_string(),
            feature: Feature::of::<HeartbeatRequest>(),
            payload: serde_json::json!({}),
            completion: Box::new(|_| {}),
        }
    }

    fn ids(queue: &mut dyn RequestQueue) -> Vec<String> {
        std::iter::from_fn(|| queue.pop()).map(|r| r.message_id).collect()
    }

    #[test]
    fn test_fifo_order_and_overflow() {
        let mut queue = new_queue(QueueOrder::Fifo, 2);
        queue.push(request("a")).unwrap();
        queue.push(request("b")).unwrap();
        let rejected = queue.push(request("c")).unwrap_err();
        assert_eq!(rejected.message_id, "c");
        assert!(queue.contains("a"));
        assert!(!queue.contains("c"));
        assert_eq!(ids(queue.as_mut()), vec!["a", "b"]);
    }

    #[test]
    fn test_lifo_order() {
        let mut queue = new_queue(QueueOrder::Lifo, 3);
        for id in ["a", "b", "c"] {
            queue.push(request(id)).unwrap();
        }
        assert_eq!(ids(queue.as_mut()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut queue = FifoQueue::new(0);
        assert!(queue.is_full());
        assert!(queue.push(request("a")).is_err());
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = FifoQueue::new(4);
        queue.push(request("a")).unwrap();
        queue.push(request("b")).unwrap();
        let drained: Vec<_> = queue.drain().into_iter().map(|r| r.message_id).collect();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(queue.is_empty());
    }
}
