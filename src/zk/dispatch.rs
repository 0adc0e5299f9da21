// Request dispatch helpers
//
// Every node operation is classified at dispatch time by two independent
// flags, "deliver asynchronously" and "register a watch", into one of four
// call types. Not every operation supports every type: mutations never take
// a watch, and the session-scoped operations exist only asynchronously in
// the client library. The validity matrix lives here, next to the types, so
// the handle's dispatch methods stay uniform.

use serde::{Deserialize, Serialize};

use crate::zk::constants::ZOK;
use crate::zk::error::{Error, Result};
use crate::zk::event::{AclEntry, Stat};

/// The four call types, from the (async, watch) flag pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Block in the library, return results directly
    Sync,
    /// Block, and additionally register a change watch
    SyncWatch,
    /// Return a status immediately; results arrive as a queued event
    Async,
    /// Asynchronous, and additionally register a change watch
    AsyncWatch,
}

impl CallMode {
    /// Classify from the two independent request flags
    pub fn from_flags(deliver_async: bool, register_watch: bool) -> Self {
        match (deliver_async, register_watch) {
            (false, false) => CallMode::Sync,
            (false, true) => CallMode::SyncWatch,
            (true, false) => CallMode::Async,
            (true, true) => CallMode::AsyncWatch,
        }
    }

    pub fn is_sync(self) -> bool {
        matches!(self, CallMode::Sync | CallMode::SyncWatch)
    }

    pub fn is_async(self) -> bool {
        !self.is_sync()
    }

    pub fn registers_watch(self) -> bool {
        matches!(self, CallMode::SyncWatch | CallMode::AsyncWatch)
    }
}

impl std::fmt::Display for CallMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CallMode::Sync => "sync",
            CallMode::SyncWatch => "sync-watch",
            CallMode::Async => "async",
            CallMode::AsyncWatch => "async-watch",
        })
    }
}

/// Reject call types an operation does not support.
///
/// `watch_allowed` / `sync_allowed` encode the per-operation matrix:
/// reads may watch, mutations may not, and add_auth/sync are async-only.
pub(crate) fn check_call_type(
    op: &'static str,
    mode: CallMode,
    watch_allowed: bool,
    sync_allowed: bool,
) -> Result<()> {
    if mode.registers_watch() && !watch_allowed {
        return Err(Error::InvalidCallType { op, mode });
    }
    if mode.is_sync() && !sync_allowed {
        return Err(Error::InvalidCallType { op, mode });
    }
    Ok(())
}

/// Immediate payload of a successful synchronous call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImmediateResult {
    /// The server-assigned path from create (sequence suffix included)
    CreatedPath(String),
    /// Node metadata from exists/set
    NodeStat(Stat),
    /// Node data plus metadata from get
    NodeData { data: Option<Vec<u8>>, stat: Stat },
    /// Child names (and metadata, when requested) from get_children
    Children {
        values: Vec<Vec<u8>>,
        stat: Option<Stat>,
    },
    /// ACL list plus metadata from get_acl
    NodeAcl { acl: Vec<AclEntry>, stat: Stat },
}

/// What a dispatch call returns right away: the library status, plus the
/// immediate payload for successful synchronous calls. Asynchronous calls
/// always leave `result` empty; their payload arrives as an event.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub rc: i32,
    pub result: Option<ImmediateResult>,
}

impl DispatchOutcome {
    /// Outcome carrying only a status (every async call, failed sync calls)
    pub fn status(rc: i32) -> Self {
        DispatchOutcome { rc, result: None }
    }

    /// Outcome of a sync call: the payload is attached only on success
    pub fn sync(rc: i32, result: Option<ImmediateResult>) -> Self {
        DispatchOutcome {
            rc,
            result: if rc == ZOK { result } else { None },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.rc == ZOK
    }
}
