//! Message id generation

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of message ids for outgoing CALLs
pub trait MessageIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

impl<F> MessageIdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}

/// Random UUID v4 ids (default)
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl MessageIdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Monotonic decimal ids starting at 1
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageIdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

/// Always the same id; for tests that match exact frames
#[derive(Debug, Clone)]
pub struct FixedIdGenerator(pub String);

impl FixedIdGenerator {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl MessageIdGenerator for FixedIdGenerator {
    fn next_id(&self) -> String {
        self.0.clone()
    }
}
