//! Usage-error types for the bridge
//!
//! Only *usage* errors live here: conditions the caller can fix, surfaced
//! synchronously and never queued as events. Status codes reported by the
//! client library are not errors in this sense; they are opaque integers
//! carried by value inside dispatch outcomes and event records, and retry
//! policy on them is the embedder's concern.

use thiserror::Error;

use crate::zk::dispatch::CallMode;

/// Errors surfaced synchronously to the caller
#[derive(Error, Debug)]
pub enum Error {
    /// The handle has been closed; nothing further may be dispatched
    #[error("handle is closed")]
    Closed,

    /// The request id is reserved for session/state events
    #[error("request id {0} is reserved for session events")]
    ReservedRequestId(i64),

    /// The operation does not support the requested call type
    #[error("{op} does not support {mode} calls")]
    InvalidCallType { op: &'static str, mode: CallMode },

    /// A blocking variant was requested against a single-threaded client
    /// library build, which cannot service it
    #[error("blocking calls require the multi-threaded client library")]
    BlockingUnsupported,

    /// Event-loop pumping was requested against a multi-threaded client
    /// library build, which drives its own I/O
    #[error("event-loop pumping requires the single-threaded client library")]
    NotCooperative,

    /// Node payload exceeds the configured maximum
    #[error("node payload too large: {len} bytes (max {max})")]
    DataTooLarge { len: usize, max: usize },

    /// The client library failed to initialize a connection
    #[error("could not initialize the client connection (status {0})")]
    ConnectFailed(i32),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;
