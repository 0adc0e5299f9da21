//! zk-bridge: the event-marshalling core of a ZooKeeper client binding.
//!
//! The wrapped client library delivers every result (synchronous returns,
//! asynchronous completions, and server-pushed watch notifications) through
//! callbacks invoked on threads the embedding program does not control. The
//! embedder, on the other hand, wants to consume results on exactly one
//! thread of its choosing. This crate is the bridge between those two worlds:
//! callbacks capture their transient arguments into owned [`zk::EventRecord`]s,
//! a single shared [`zk::EventQueue`] hands them to the consumer in strict
//! FIFO order, and [`zk::ZkHandle`] owns the whole arrangement including the
//! fork-aware teardown path.
//!
//! The coordination protocol itself (sessions, watches, failover) is *not*
//! implemented here; it lives behind the [`zk::ZooKeeperClient`] trait.

mod config; // Connection configuration (hosts, timeouts, threading mode)
pub mod zk; // The marshalling core (queue, records, adapters, handle)


pub use config::{Config, ThreadingMode};
pub use zk::client::{SessionCredentials, ZooKeeperClient};
pub use zk::dispatch::{CallMode, DispatchOutcome, ImmediateResult};
pub use zk::error::{Error, Result};
pub use zk::event::{AclEntry, Completion, CompletionKind, EventRecord, Stat};
pub use zk::handle::ZkHandle;
pub use zk::queue::EventQueue;
