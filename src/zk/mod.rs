// ZooKeeper binding core
//
// This module contains the marshalling machinery that sits between the
// external client library and the embedding program:
// - Event records and their payload variants
// - The single-consumer event queue with its wake channel
// - Completion adapters (one per callback shape the library invokes)
// - Calling contexts (per-request correlation tokens)
// - The instance handle with its fork-aware teardown
//
// Architecture Overview:
// =====================
//
// This module bridges two worlds:
//
// 1. CALLBACK WORLD (library threads):
//    - The client library invokes completion and watch callbacks on its own
//      internal threads (or, in single-threaded builds, inside an explicit
//      "process I/O" step driven by the embedder)
//    - Callback arguments are transient: the library reclaims them the
//      moment the callback returns
//
// 2. CONSUMER WORLD (one embedder thread):
//    - Wants results as owned, self-contained values
//    - Blocks until something is ready, then drains
//
// The EVENT QUEUE is the bridge, and the only state the two worlds share:
//   callback → adapter copies arguments → [Event Queue] → consumer drains
//
// Everything else is single-owner: each calling context is consumed by
// exactly one adapter invocation (or by teardown), and the client handle is
// touched only by dispatch calls and by teardown.

pub mod client;
pub mod completions;
pub mod constants;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handle;
pub mod queue;

// Re-export commonly used types for convenience
pub use client::{SessionCredentials, ZooKeeperClient};
pub use constants::GLOBAL_REQUEST_ID;
pub use context::CallingContext;
pub use dispatch::{CallMode, DispatchOutcome, ImmediateResult};
pub use error::{Error, Result};
pub use event::{AclEntry, Completion, CompletionKind, EventRecord, Stat};
pub use handle::ZkHandle;
pub use queue::EventQueue;
