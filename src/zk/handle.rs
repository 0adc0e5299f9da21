// The instance handle: one client connection plus its event queue
//
// ZkHandle owns everything with a lifetime: the boxed client, the queue the
// completion adapters feed, the persistent session-watcher context, and the
// process id that created it all. Dispatch methods are thin and uniform
// (validate, build adapters, call the client) while close() walks the
// teardown sequence in its mandated order, including the fork-detection step
// that keeps a forked child from corrupting its parent's live session.
//
// ## Fork safety
//
// A handle created before fork() holds OS resources (a socket, mutexes owned
// by library threads that do not exist in the child). Running the library's
// normal close handshake in the child would transmit a session-termination
// message tagged with the PARENT's session id. Teardown therefore compares
// the current process id against the creation-time one and, on mismatch,
// severs the connection descriptor first so the handshake degrades into a
// harmless connection-loss error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::{Config, ThreadingMode};
use crate::zk::client::{SessionCredentials, WatchCallback, ZooKeeperClient};
use crate::zk::completions;
use crate::zk::constants::{status_message, GLOBAL_REQUEST_ID, ZOK};
use crate::zk::context::CallingContext;
use crate::zk::dispatch::{check_call_type, CallMode, DispatchOutcome, ImmediateResult};
use crate::zk::error::{Error, Result};
use crate::zk::event::{AclEntry, EventRecord};
use crate::zk::queue::EventQueue;

/// One live connection to the coordination service
pub struct ZkHandle {
    /// `None` is the closed sentinel: every dispatch path checks it under
    /// the read lock, so nothing can race the teardown's `take`.
    client: RwLock<Option<Box<dyn ZooKeeperClient>>>,
    queue: Arc<EventQueue>,
    /// The persistent session-watcher context, released at teardown step 4
    session_ctx: Mutex<Option<Arc<CallingContext>>>,
    /// Process id at creation time; compared at teardown for fork detection
    owner_pid: u32,
    mode: ThreadingMode,
    recv_timeout_ms: u32,
    max_node_size: usize,
    closed: AtomicBool,
}

impl ZkHandle {
    /// Connect through the given client-library entry point.
    ///
    /// The connector receives the validated config and the session watcher
    /// callback and returns the initialized client, mirroring the library's
    /// init call. Initialization failure is fatal to construction.
    pub fn connect<C>(config: Config, connector: C) -> Result<ZkHandle>
    where
        C: FnOnce(&Config, WatchCallback) -> std::result::Result<Box<dyn ZooKeeperClient>, i32>,
    {
        config.validate()?;

        let queue = Arc::new(EventQueue::new());
        let session_ctx = Arc::new(CallingContext::global(&queue));
        let session_watcher = completions::session_watch_adapter(session_ctx.clone());

        let client = connector(&config, session_watcher).map_err(Error::ConnectFailed)?;

        Ok(ZkHandle {
            client: RwLock::new(Some(client)),
            queue,
            session_ctx: Mutex::new(Some(session_ctx)),
            owner_pid: std::process::id(),
            mode: config.threading,
            recv_timeout_ms: config.recv_timeout_ms,
            max_node_size: config.max_node_size,
            closed: AtomicBool::new(false),
        })
    }

    // ----- dispatch -----

    pub fn create(
        &self,
        req_id: i64,
        path: &str,
        data: Option<&[u8]>,
        acl: &[AclEntry],
        flags: i32,
        mode: CallMode,
    ) -> Result<DispatchOutcome> {
        self.check_dispatch("create", req_id, mode, false, true)?;
        self.check_data_size(data)?;
        self.with_client(|client| match mode {
            CallMode::Sync => {
                let (rc, created) = client.create(path, data, acl, flags);
                DispatchOutcome::sync(rc, created.map(ImmediateResult::CreatedPath))
            }
            _ => {
                let completion = completions::string_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.create_async(path, data, acl, flags, completion))
            }
        })
    }

    pub fn delete(
        &self,
        req_id: i64,
        path: &str,
        version: i32,
        mode: CallMode,
    ) -> Result<DispatchOutcome> {
        self.check_dispatch("delete", req_id, mode, false, true)?;
        self.with_client(|client| match mode {
            CallMode::Sync => DispatchOutcome::status(client.delete(path, version)),
            _ => {
                let completion = completions::void_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.delete_async(path, version, completion))
            }
        })
    }

    pub fn exists(&self, req_id: i64, path: &str, mode: CallMode) -> Result<DispatchOutcome> {
        self.check_dispatch("exists", req_id, mode, true, true)?;
        let watch = self.watch_for(req_id, mode);
        self.with_client(|client| {
            if mode.is_sync() {
                let (rc, stat) = client.exists(path, watch);
                DispatchOutcome::sync(rc, stat.map(ImmediateResult::NodeStat))
            } else {
                let completion = completions::stat_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.exists_async(path, watch, completion))
            }
        })
    }

    pub fn get(&self, req_id: i64, path: &str, mode: CallMode) -> Result<DispatchOutcome> {
        self.check_dispatch("get", req_id, mode, true, true)?;
        let watch = self.watch_for(req_id, mode);
        self.with_client(|client| {
            if mode.is_sync() {
                let (rc, data, stat) = client.get(path, watch);
                DispatchOutcome::sync(rc, stat.map(|stat| ImmediateResult::NodeData { data, stat }))
            } else {
                let completion = completions::data_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.get_async(path, watch, completion))
            }
        })
    }

    pub fn set(
        &self,
        req_id: i64,
        path: &str,
        data: Option<&[u8]>,
        version: i32,
        mode: CallMode,
    ) -> Result<DispatchOutcome> {
        self.check_dispatch("set", req_id, mode, false, true)?;
        self.check_data_size(data)?;
        self.with_client(|client| match mode {
            CallMode::Sync => {
                let (rc, stat) = client.set(path, data, version);
                DispatchOutcome::sync(rc, stat.map(ImmediateResult::NodeStat))
            }
            _ => {
                let completion = completions::stat_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.set_async(path, data, version, completion))
            }
        })
    }

    /// Child names only; see [`get_children_with_stat`](Self::get_children_with_stat)
    /// for the variant that also reports the parent's metadata.
    pub fn get_children(&self, req_id: i64, path: &str, mode: CallMode) -> Result<DispatchOutcome> {
        self.check_dispatch("get_children", req_id, mode, true, true)?;
        let watch = self.watch_for(req_id, mode);
        self.with_client(|client| {
            if mode.is_sync() {
                let (rc, values) = client.get_children(path, watch);
                DispatchOutcome::sync(
                    rc,
                    values.map(|values| ImmediateResult::Children { values, stat: None }),
                )
            } else {
                let completion = completions::strings_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.get_children_async(path, watch, completion))
            }
        })
    }

    pub fn get_children_with_stat(
        &self,
        req_id: i64,
        path: &str,
        mode: CallMode,
    ) -> Result<DispatchOutcome> {
        self.check_dispatch("get_children_with_stat", req_id, mode, true, true)?;
        let watch = self.watch_for(req_id, mode);
        self.with_client(|client| {
            if mode.is_sync() {
                let (rc, values, stat) = client.get_children_with_stat(path, watch);
                DispatchOutcome::sync(
                    rc,
                    values.map(|values| ImmediateResult::Children { values, stat }),
                )
            } else {
                let completion = completions::strings_stat_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.get_children_with_stat_async(
                    path, watch, completion,
                ))
            }
        })
    }

    pub fn get_acl(&self, req_id: i64, path: &str, mode: CallMode) -> Result<DispatchOutcome> {
        self.check_dispatch("get_acl", req_id, mode, false, true)?;
        self.with_client(|client| match mode {
            CallMode::Sync => {
                let (rc, acl, stat) = client.get_acl(path);
                let result = match (acl, stat) {
                    (Some(acl), Some(stat)) => Some(ImmediateResult::NodeAcl { acl, stat }),
                    _ => None,
                };
                DispatchOutcome::sync(rc, result)
            }
            _ => {
                let completion = completions::acl_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.get_acl_async(path, completion))
            }
        })
    }

    pub fn set_acl(
        &self,
        req_id: i64,
        path: &str,
        acl: &[AclEntry],
        version: i32,
        mode: CallMode,
    ) -> Result<DispatchOutcome> {
        self.check_dispatch("set_acl", req_id, mode, false, true)?;
        self.with_client(|client| match mode {
            CallMode::Sync => DispatchOutcome::status(client.set_acl(path, acl, version)),
            _ => {
                let completion = completions::void_adapter(self.per_call_ctx(req_id));
                DispatchOutcome::status(client.set_acl_async(path, acl, version, completion))
            }
        })
    }

    /// Present session credentials to the server. Asynchronous only, as in
    /// the client library.
    pub fn add_auth(
        &self,
        req_id: i64,
        scheme: &str,
        certificate: &[u8],
        mode: CallMode,
    ) -> Result<DispatchOutcome> {
        self.check_dispatch("add_auth", req_id, mode, false, false)?;
        self.with_client(|client| {
            let completion = completions::void_adapter(self.per_call_ctx(req_id));
            DispatchOutcome::status(client.add_auth_async(scheme, certificate, completion))
        })
    }

    /// Flush the server's view of the path. Asynchronous only, as in the
    /// client library.
    pub fn sync(&self, req_id: i64, path: &str, mode: CallMode) -> Result<DispatchOutcome> {
        self.check_dispatch("sync", req_id, mode, false, false)?;
        self.with_client(|client| {
            let completion = completions::string_adapter(self.per_call_ctx(req_id));
            DispatchOutcome::status(client.sync_async(path, completion))
        })
    }

    // ----- event consumption -----

    /// Take the oldest queued event.
    ///
    /// With `blocking` set (multi-threaded mode only) the call waits on the
    /// wake channel first; it may still return `None` after an explicit
    /// [`wake_blocked_consumer`](Self::wake_blocked_consumer) or a stale
    /// wake token, so callers loop.
    pub fn next_event(&self, blocking: bool) -> Result<Option<EventRecord>> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        if let Some(event) = self.queue.pop() {
            return Ok(Some(event));
        }
        if !blocking {
            return Ok(None);
        }
        if self.mode == ThreadingMode::SingleThreaded {
            return Err(Error::BlockingUnsupported);
        }
        self.queue.wait_for_wake();
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(self.queue.pop())
    }

    /// True iff an event is waiting. Non-destructive.
    pub fn has_pending_event(&self) -> bool {
        self.queue.has_pending()
    }

    /// Unblock a consumer sitting in a blocking [`next_event`](Self::next_event)
    /// without enqueuing anything.
    pub fn wake_blocked_consumer(&self) {
        self.queue.signal();
    }

    /// Single-threaded mode: run one readiness/process cycle, returning
    /// early if the wake channel or the queue already has something.
    pub fn pump(&self, max_wait: Duration) -> Result<i32> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        if self.mode != ThreadingMode::SingleThreaded {
            return Err(Error::NotCooperative);
        }
        if self.queue.take_wake_token() || self.queue.has_pending() {
            return Ok(ZOK);
        }
        self.with_client(|client| client.process_io(max_wait))
    }

    // ----- session accessors -----

    pub fn connection_state(&self) -> Result<i32> {
        self.with_client(|client| client.state())
    }

    pub fn is_unrecoverable(&self) -> Result<bool> {
        self.with_client(|client| client.is_unrecoverable())
    }

    pub fn client_identity(&self) -> Result<SessionCredentials> {
        self.with_client(|client| client.client_id())
    }

    pub fn recv_timeout(&self) -> u32 {
        self.recv_timeout_ms
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// True iff the process has forked since this handle was created.
    ///
    /// This is the single fork-detection point: teardown consults it to
    /// decide whether the connection descriptor must be severed before the
    /// library's close handshake runs (see the module comment).
    pub fn forked_since(&self) -> bool {
        std::process::id() != self.owner_pid
    }

    // ----- teardown -----

    /// Close the handle. The returned status is the library's advisory
    /// close result; resource release happens unconditionally and in order.
    pub fn close(&self) -> Result<i32> {
        // Step 1: fail-fast flag, so concurrent dispatch stops racing us.
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }

        let mut rc = ZOK;
        // Steps 2-3: sever the descriptor first if a fork happened, then
        // run the normal close path; its status is captured, not acted on.
        if let Some(mut client) = self.client.write().take() {
            if self.forked_since() {
                warn!(
                    owner_pid = self.owner_pid,
                    current_pid = std::process::id(),
                    "fork detected at teardown; severing connection descriptor before close"
                );
                client.sever_connection();
            }
            rc = client.close();
            if rc != ZOK {
                debug!(rc, status = status_message(rc), "client close status");
            }
        }

        // Step 4: release the persistent session-watcher context.
        *self.session_ctx.lock() = None;

        // Steps 5-6: wake any blocked consumer, then release every
        // unconsumed record. The client slot is already the closed sentinel.
        self.queue.close();
        let dropped = self.queue.drain();
        if dropped > 0 {
            debug!(dropped, "discarded unconsumed events during teardown");
        }

        Ok(rc)
    }

    // ----- internals -----

    fn per_call_ctx(&self, req_id: i64) -> CallingContext {
        CallingContext::new(req_id, &self.queue)
    }

    fn watch_for(&self, req_id: i64, mode: CallMode) -> Option<WatchCallback> {
        mode.registers_watch()
            .then(|| completions::watch_adapter(self.per_call_ctx(req_id)))
    }

    fn with_client<T>(&self, f: impl FnOnce(&dyn ZooKeeperClient) -> T) -> Result<T> {
        let guard = self.client.read();
        match guard.as_deref() {
            Some(client) => Ok(f(client)),
            None => Err(Error::Closed),
        }
    }

    fn check_dispatch(
        &self,
        op: &'static str,
        req_id: i64,
        mode: CallMode,
        watch_allowed: bool,
        sync_allowed: bool,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        if req_id == GLOBAL_REQUEST_ID {
            return Err(Error::ReservedRequestId(req_id));
        }
        check_call_type(op, mode, watch_allowed, sync_allowed)?;
        if mode.is_sync() && self.mode == ThreadingMode::SingleThreaded {
            return Err(Error::BlockingUnsupported);
        }
        Ok(())
    }

    fn check_data_size(&self, data: Option<&[u8]>) -> Result<()> {
        if let Some(data) = data {
            if data.len() > self.max_node_size {
                return Err(Error::DataTooLarge {
                    len: data.len(),
                    max: self.max_node_size,
                });
            }
        }
        Ok(())
    }

    /// Simulate a post-fork state for teardown tests
    #[cfg(test)]
    pub(crate) fn pretend_forked(&mut self) {
        self.owner_pid = self.owner_pid.wrapping_add(1);
    }
}

impl Drop for ZkHandle {
    fn drop(&mut self) {
        if !self.is_closed() {
            debug!("handle dropped without explicit close; tearing down");
            let _ = self.close();
        }
    }
}
