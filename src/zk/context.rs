//! Calling contexts: per-request correlation tokens
//!
//! Every asynchronous call hands the client library an opaque context; when
//! the matching callback fires, that context is what tells the adapter which
//! request the payload belongs to and which queue wants it. The C layer
//! passed a raw heap pointer through `void*` and freed it inside the
//! callback; here the context is an owned value moved into the adapter
//! closure, so "freed exactly once, by whoever consumes it" is the only
//! thing the compiler will accept.
//!
//! The queue reference is weak on purpose: a callback can fire after
//! teardown has already dropped the queue, and that race must degrade to a
//! logged no-op rather than keep the queue alive or touch freed state.

use std::sync::{Arc, Weak};

use tracing::debug;

use crate::zk::constants::GLOBAL_REQUEST_ID;
use crate::zk::event::{Completion, EventRecord};
use crate::zk::queue::EventQueue;

/// Correlation token passed (via closure capture) through the client library
pub struct CallingContext {
    request_id: i64,
    queue: Weak<EventQueue>,
}

impl CallingContext {
    pub fn new(request_id: i64, queue: &Arc<EventQueue>) -> Self {
        CallingContext {
            request_id,
            queue: Arc::downgrade(queue),
        }
    }

    /// The persistent session-watcher context, reserved-id keyed
    pub fn global(queue: &Arc<EventQueue>) -> Self {
        CallingContext::new(GLOBAL_REQUEST_ID, queue)
    }

    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    pub fn is_global(&self) -> bool {
        self.request_id == GLOBAL_REQUEST_ID
    }

    /// Wrap a completion into a record for this request and enqueue it.
    /// Dropped with a diagnostic if the queue is already gone.
    pub fn deliver(&self, completion: Completion) {
        match self.queue.upgrade() {
            Some(queue) => queue.push(EventRecord::new(self.request_id, completion)),
            None => debug!(
                request_id = self.request_id,
                "dropping completion delivered after queue teardown"
            ),
        }
    }
}
