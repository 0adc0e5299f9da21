//! The external client library's interface
//!
//! The coordination protocol (session negotiation, watch re-registration,
//! server failover) is not this crate's business. It is consumed behind
//! [`ZooKeeperClient`], a trait shaped like the C client's API: every
//! operation exists as a blocking variant that returns its results directly
//! and as a callback-registering variant that returns only a dispatch status.
//!
//! Callback arguments are deliberately *borrowed* (`&[u8]`, `&Stat`,
//! `&str`). The real library reclaims or reuses its buffers the moment a
//! callback returns, so an implementation of this trait hands out borrows
//! and the completion adapters are structurally forced to copy before the
//! data crosses a thread boundary.

use std::time::Duration;

use crate::zk::constants::{SESSION_PASSWD_LEN, ZOK};
use crate::zk::event::{AclEntry, Stat};

/// Completion callback for operations with no payload (delete, set_acl,
/// add_auth)
pub type VoidCallback = Box<dyn FnOnce(i32) + Send>;

/// Completion callback carrying a single string, e.g. the server-assigned
/// path from create
pub type StringCallback = Box<dyn FnOnce(i32, Option<&[u8]>) + Send>;

/// Completion callback carrying node metadata (exists, set)
pub type StatCallback = Box<dyn FnOnce(i32, Option<&Stat>) + Send>;

/// Completion callback carrying node data plus metadata (get). The slice
/// length is authoritative; the bytes may contain NULs.
pub type DataCallback = Box<dyn FnOnce(i32, Option<&[u8]>, Option<&Stat>) + Send>;

/// Completion callback carrying a child-name list (get_children)
pub type StringsCallback = Box<dyn FnOnce(i32, Option<&[Vec<u8>]>) + Send>;

/// Completion callback carrying a child-name list plus metadata
pub type StringsStatCallback = Box<dyn FnOnce(i32, Option<&[Vec<u8>]>, Option<&Stat>) + Send>;

/// Completion callback carrying an ACL list plus metadata (get_acl)
pub type AclCallback = Box<dyn FnOnce(i32, Option<&[AclEntry]>, Option<&Stat>) + Send>;

/// Watch callback: `(event_type, session_state, path)`. `FnMut` because the
/// session watcher is invoked for every state transition over the handle's
/// lifetime; node watches are one-shot and simply never fire twice.
pub type WatchCallback = Box<dyn FnMut(i32, i32, Option<&str>) + Send>;

/// Session id plus secret, as negotiated with (or re-presented to) the server
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SessionCredentials {
    pub session_id: i64,
    pub passwd: [u8; SESSION_PASSWD_LEN],
}

impl SessionCredentials {
    pub fn new(session_id: i64, passwd: [u8; SESSION_PASSWD_LEN]) -> Self {
        SessionCredentials { session_id, passwd }
    }
}

/// Never print the session secret
impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("session_id", &self.session_id)
            .field("passwd", &"[REDACTED]")
            .finish()
    }
}

/// The opaque coordination-service client.
///
/// Implementations must tolerate concurrent calls from multiple threads
/// (multi-threaded library builds) or document that everything happens on
/// one thread (single-threaded builds); the bridge enforces the matching
/// call-type restrictions either way.
pub trait ZooKeeperClient: Send + Sync {
    // ----- create -----
    fn create(
        &self,
        path: &str,
        data: Option<&[u8]>,
        acl: &[AclEntry],
        flags: i32,
    ) -> (i32, Option<String>);
    fn create_async(
        &self,
        path: &str,
        data: Option<&[u8]>,
        acl: &[AclEntry],
        flags: i32,
        completion: StringCallback,
    ) -> i32;

    // ----- delete -----
    fn delete(&self, path: &str, version: i32) -> i32;
    fn delete_async(&self, path: &str, version: i32, completion: VoidCallback) -> i32;

    // ----- exists -----
    fn exists(&self, path: &str, watch: Option<WatchCallback>) -> (i32, Option<Stat>);
    fn exists_async(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
        completion: StatCallback,
    ) -> i32;

    // ----- get -----
    fn get(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<u8>>, Option<Stat>);
    fn get_async(&self, path: &str, watch: Option<WatchCallback>, completion: DataCallback) -> i32;

    // ----- set -----
    fn set(&self, path: &str, data: Option<&[u8]>, version: i32) -> (i32, Option<Stat>);
    fn set_async(
        &self,
        path: &str,
        data: Option<&[u8]>,
        version: i32,
        completion: StatCallback,
    ) -> i32;

    // ----- get_children (names only) -----
    fn get_children(&self, path: &str, watch: Option<WatchCallback>)
        -> (i32, Option<Vec<Vec<u8>>>);
    fn get_children_async(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
        completion: StringsCallback,
    ) -> i32;

    // ----- get_children (names + stat) -----
    fn get_children_with_stat(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<Vec<u8>>>, Option<Stat>);
    fn get_children_with_stat_async(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
        completion: StringsStatCallback,
    ) -> i32;

    // ----- ACLs -----
    fn get_acl(&self, path: &str) -> (i32, Option<Vec<AclEntry>>, Option<Stat>);
    fn get_acl_async(&self, path: &str, completion: AclCallback) -> i32;
    fn set_acl(&self, path: &str, acl: &[AclEntry], version: i32) -> i32;
    fn set_acl_async(
        &self,
        path: &str,
        acl: &[AclEntry],
        version: i32,
        completion: VoidCallback,
    ) -> i32;

    // ----- session-scoped operations (async-only in the library) -----
    fn add_auth_async(&self, scheme: &str, certificate: &[u8], completion: VoidCallback) -> i32;
    fn sync_async(&self, path: &str, completion: StringCallback) -> i32;

    // ----- session accessors -----
    fn state(&self) -> i32;
    fn is_unrecoverable(&self) -> bool;
    fn client_id(&self) -> SessionCredentials;

    // ----- lifecycle -----
    /// Run the library's close handshake. After this returns the client is
    /// unusable; the return value is advisory.
    fn close(&mut self) -> i32;

    /// Forcibly close the underlying connection descriptor WITHOUT the
    /// close handshake.
    ///
    /// This is the single capability the fork-safety path needs: in a
    /// forked child, running the normal close path would send a
    /// session-termination message tagged with the parent's session id and
    /// corrupt state the parent still depends on. Severing the descriptor
    /// first turns the subsequent [`close`](Self::close) into a harmless
    /// connection-already-lost error. Callers other than handle teardown
    /// have no business here.
    fn sever_connection(&self);

    /// Single-threaded builds only: perform one readiness/process cycle,
    /// waiting at most `max_wait`. Multi-threaded builds drive their own
    /// I/O and may keep this default no-op.
    fn process_io(&self, max_wait: Duration) -> i32 {
        let _ = max_wait;
        ZOK
    }
}
