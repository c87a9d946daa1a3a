//! Bounded event queue between frame processing and the host callback.
//!
//! The queue guarantees that the event callback is never invoked re-entrantly
//! from inside frame decoding: `poll` enqueues while it decodes and drains
//! only afterwards. The primitive is MPMC-safe, so a host may also hand the
//! consumer side to another task.

use crate::protocol::ObsEvent;
use crossbeam_queue::ArrayQueue;

/// Capacity of the event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 10;

/// Bounded FIFO of owned event records.
///
/// `push` never blocks and never overwrites: when the queue is full the
/// incoming record is rejected and dropped by the caller.
#[derive(Debug)]
pub struct EventQueue {
    inner: ArrayQueue<ObsEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Returns false when the queue is full and the record was rejected.
    pub fn push(&self, event: ObsEvent) -> bool {
        self.inner.push(event).is_ok()
    }

    pub fn pop(&self) -> Option<ObsEvent> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop all queued records without delivering them.
    pub fn clear(&self) {
        while self.inner.pop().is_some() {}
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
