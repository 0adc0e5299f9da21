// Configuration module for zk-bridge
//
// Unlike a server-side component, a binding core receives its configuration
// from the embedding program at connect time, so this is a plain struct with
// defaults rather than a registry of reloadable parameters.

use crate::zk::client::SessionCredentials;
use crate::zk::constants::{
    DEFAULT_HOSTS, DEFAULT_RECV_TIMEOUT_MS, MAX_NODE_DATA_SIZE, MIN_RECV_TIMEOUT_MS,
};
use crate::zk::error::{Error, Result};

/// How the external client library schedules its I/O.
///
/// The marshalling core is identical in both modes; the mode only governs
/// which consumption and dispatch styles are legal (see `ZkHandle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadingMode {
    /// The library runs its own I/O thread(s); callbacks arrive on them.
    /// Blocking dispatch and a blocking `next_event` are available.
    MultiThreaded,
    /// The library does no threading of its own; the embedder drives I/O
    /// through `ZkHandle::pump`. Blocking calls are usage errors.
    SingleThreaded,
}

/// Configuration for one client connection
pub struct Config {
    /// Comma-separated `host:port` connect string handed to the client library
    pub hosts: String,
    /// Session receive timeout requested from the server, in milliseconds
    pub recv_timeout_ms: u32,
    /// Threading mode of the client library build (see [`ThreadingMode`])
    pub threading: ThreadingMode,
    /// Credentials of a previous session to re-attach to, if any
    pub session: Option<SessionCredentials>,
    /// Upper bound on node payloads accepted at dispatch time, in bytes
    pub max_node_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hosts: DEFAULT_HOSTS.to_string(),
            recv_timeout_ms: DEFAULT_RECV_TIMEOUT_MS,
            threading: ThreadingMode::MultiThreaded,
            session: None,
            max_node_size: MAX_NODE_DATA_SIZE,
        }
    }
}

/// Custom Debug implementation that leans on the credential-redacting
/// Debug of SessionCredentials, so a logged Config never exposes a secret
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hosts", &self.hosts)
            .field("recv_timeout_ms", &self.recv_timeout_ms)
            .field("threading", &self.threading)
            .field("session", &self.session)
            .field("max_node_size", &self.max_node_size)
            .finish()
    }
}

impl Config {
    /// Config with defaults for the given connect string
    pub fn new(hosts: impl Into<String>) -> Self {
        Config {
            hosts: hosts.into(),
            ..Config::default()
        }
    }

    /// Check the configuration before it is handed to the client library
    pub fn validate(&self) -> Result<()> {
        if self.hosts.trim().is_empty() {
            return Err(Error::InvalidConfig("connect string is empty".into()));
        }
        if self.recv_timeout_ms < MIN_RECV_TIMEOUT_MS {
            return Err(Error::InvalidConfig(format!(
                "recv_timeout_ms {} below minimum {}",
                self.recv_timeout_ms, MIN_RECV_TIMEOUT_MS
            )));
        }
        if self.max_node_size == 0 {
            return Err(Error::InvalidConfig("max_node_size is zero".into()));
        }
        Ok(())
    }
}
