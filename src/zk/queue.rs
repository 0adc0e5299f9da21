// The single-consumer event queue
//
// This is the only structure shared between the library's callback threads
// and the consumer thread. Producers append completed records under a short
// mutex hold and then nudge the consumer through a wake channel; the consumer
// blocks on that channel and drains the deque.
//
// ## Wake semantics
//
// The wake channel replaces the self-pipe of the C implementation and keeps
// its contract: tokens are an edge-triggered "something may be ready" signal,
// NOT a one-to-one count of records. Producers send best-effort (a full
// buffer is normal and harmless), and consumers must re-check the deque after
// every wake and tolerate wakes that deliver nothing.
//
// ## Shutdown
//
// Callbacks can legitimately fire after teardown has begun. Once `close` has
// been called, `push` degrades to a logged no-op instead of growing a queue
// nobody will drain.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::debug;

use crate::zk::constants::WAKE_BUFFER;
use crate::zk::event::EventRecord;

/// FIFO of completion records with a wake channel for the blocked consumer
pub struct EventQueue {
    records: Mutex<VecDeque<EventRecord>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    shutdown: AtomicBool,
    /// Process id at allocation time; a later mismatch means a fork happened
    owner_pid: u32,
}

impl EventQueue {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(WAKE_BUFFER);
        EventQueue {
            records: Mutex::new(VecDeque::new()),
            wake_tx,
            wake_rx,
            shutdown: AtomicBool::new(false),
            owner_pid: std::process::id(),
        }
    }

    /// Append a record and nudge the consumer.
    ///
    /// Callable from any thread. After `close`, the record is dropped with a
    /// diagnostic; late callbacks racing teardown are expected, not errors.
    pub fn push(&self, record: EventRecord) {
        if self.shutdown.load(Ordering::Acquire) {
            debug!(
                request_id = record.request_id,
                "dropping event enqueued after queue shutdown"
            );
            return;
        }
        self.records.lock().push_back(record);
        // Outside the lock. Best-effort: a full wake buffer already means the
        // consumer has a pending nudge, and it drains opportunistically.
        if let Err(TrySendError::Disconnected(())) = self.wake_tx.try_send(()) {
            debug!("wake channel disconnected during push");
        }
    }

    /// True iff at least one record is waiting. Non-destructive.
    pub fn has_pending(&self) -> bool {
        !self.records.lock().is_empty()
    }

    /// Pop the oldest record, if any. Strict enqueue order is preserved
    /// across all request ids.
    pub fn pop(&self) -> Option<EventRecord> {
        self.records.lock().pop_front()
    }

    /// Wake a blocked consumer without enqueuing anything, e.g. to make it
    /// re-check shutdown state.
    pub fn signal(&self) {
        if let Err(TrySendError::Disconnected(())) = self.wake_tx.try_send(()) {
            debug!("wake channel disconnected during signal");
        }
    }

    /// Block until a wake token arrives. A token does not guarantee a
    /// record; callers re-check the queue afterwards.
    pub fn wait_for_wake(&self) {
        let _ = self.wake_rx.recv();
    }

    /// Like [`wait_for_wake`](Self::wait_for_wake) with an upper bound.
    /// Returns true if a token arrived before the timeout.
    pub fn wait_for_wake_timeout(&self, timeout: Duration) -> bool {
        self.wake_rx.recv_timeout(timeout).is_ok()
    }

    /// Consume one pending wake token without blocking, if there is one
    pub fn take_wake_token(&self) -> bool {
        self.wake_rx.try_recv().is_ok()
    }

    /// Mark the queue shut down and wake any blocked consumer. Subsequent
    /// pushes are dropped; pops keep working so teardown can drain.
    pub fn close(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.signal();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Release every unconsumed record and all stale wake tokens. Returns
    /// the number of records discarded.
    pub fn drain(&self) -> usize {
        let mut guard = self.records.lock();
        let dropped = guard.len();
        guard.clear();
        drop(guard);
        while self.wake_rx.try_recv().is_ok() {}
        dropped
    }

    /// Process id of the process that allocated this queue
    pub fn owner_pid(&self) -> u32 {
        self.owner_pid
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        EventQueue::new()
    }
}
