// Event records: the self-contained payloads handed to the consumer
//
// Every callback the client library fires is captured into exactly one
// EventRecord before it crosses a thread boundary. Records own all of their
// buffers, nothing in here borrows from the library, so a record can sit
// in the queue indefinitely and be dropped at any point without coordination.
//
// The original C layer modeled this as a tagged union plus a hand-written
// free function per variant; the enum below makes both the exactly-one-payload
// invariant and exhaustive handling compiler-enforced, and release is just
// Drop.

use serde::{Deserialize, Serialize};

/// Fixed-size per-node metadata reported by the coordination service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stat {
    /// zxid of the transaction that created the node
    pub czxid: i64,
    /// zxid of the transaction that last modified the node
    pub mzxid: i64,
    /// Creation time, milliseconds since the epoch
    pub ctime: i64,
    /// Last-modification time, milliseconds since the epoch
    pub mtime: i64,
    /// Number of data changes
    pub version: i32,
    /// Number of child-list changes
    pub cversion: i32,
    /// Number of ACL changes
    pub aversion: i32,
    /// Session id of the owner if the node is ephemeral, else 0
    pub ephemeral_owner: i64,
    /// Length of the node's data, in bytes
    pub data_length: i32,
    /// Number of children
    pub num_children: i32,
    /// zxid of the transaction that last modified the node's children
    pub pzxid: i64,
}

/// One access-control entry: a scheme/identity pair plus a permission mask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Permission bitmask (`PERM_*` constants)
    pub perms: i32,
    /// Authentication scheme, e.g. "world", "digest", "auth"
    pub scheme: String,
    /// Identity within the scheme
    pub id: String,
}

impl AclEntry {
    pub fn new(perms: i32, scheme: impl Into<String>, id: impl Into<String>) -> Self {
        AclEntry {
            perms,
            scheme: scheme.into(),
            id: id.into(),
        }
    }

    /// The `world:anyone` identity with the given permissions
    pub fn world_anyone(perms: i32) -> Self {
        AclEntry::new(perms, "world", "anyone")
    }
}

/// Discriminant of a completion payload, for consumers that route on shape
/// before destructuring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionKind {
    Void,
    String,
    Stat,
    Data,
    Acl,
    Strings,
    StringsStat,
    Watcher,
}

/// The payload of one completion or watch notification.
///
/// Every variant except `Watcher` carries `rc`, the library's opaque status
/// code for the call. Fields the library passed as null stay `None`; they
/// are never coerced into empty collections, because "no children vector"
/// and "zero children" are different answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Completion {
    /// Completion with no payload beyond the status (delete, set_acl, add_auth)
    Void { rc: i32 },
    /// A single string result, e.g. the server-assigned path from create.
    /// Kept as bytes: paths are opaque byte strings to the bridge.
    String { rc: i32, value: Option<Vec<u8>> },
    /// Node metadata only (exists, set)
    Stat { rc: i32, stat: Option<Stat> },
    /// Node data plus metadata (get). The buffer length is authoritative;
    /// the data may contain NUL bytes and must never be treated as a C string.
    Data {
        rc: i32,
        data: Option<Vec<u8>>,
        stat: Option<Stat>,
    },
    /// ACL list plus metadata (get_acl)
    Acl {
        rc: i32,
        acl: Option<Vec<AclEntry>>,
        stat: Option<Stat>,
    },
    /// Child-name list (get_children)
    Strings {
        rc: i32,
        values: Option<Vec<Vec<u8>>>,
    },
    /// Child-name list plus metadata (get_children with stat)
    StringsStat {
        rc: i32,
        values: Option<Vec<Vec<u8>>>,
        stat: Option<Stat>,
    },
    /// Watch or session-state notification. Carries no status code; the
    /// host conversion must omit that field for this kind only.
    Watcher {
        event_type: i32,
        state: i32,
        path: Option<String>,
    },
}

impl Completion {
    /// The shape discriminant of this payload
    pub fn kind(&self) -> CompletionKind {
        match self {
            Completion::Void { .. } => CompletionKind::Void,
            Completion::String { .. } => CompletionKind::String,
            Completion::Stat { .. } => CompletionKind::Stat,
            Completion::Data { .. } => CompletionKind::Data,
            Completion::Acl { .. } => CompletionKind::Acl,
            Completion::Strings { .. } => CompletionKind::Strings,
            Completion::StringsStat { .. } => CompletionKind::StringsStat,
            Completion::Watcher { .. } => CompletionKind::Watcher,
        }
    }

    /// The library status code, absent only for watcher notifications
    pub fn result_code(&self) -> Option<i32> {
        match self {
            Completion::Void { rc }
            | Completion::String { rc, .. }
            | Completion::Stat { rc, .. }
            | Completion::Data { rc, .. }
            | Completion::Acl { rc, .. }
            | Completion::Strings { rc, .. }
            | Completion::StringsStat { rc, .. } => Some(*rc),
            Completion::Watcher { .. } => None,
        }
    }
}

/// One queued event: a correlation id plus its payload.
///
/// `request_id` ties the event back to the dispatch call that caused it, or
/// is [`GLOBAL_REQUEST_ID`](crate::zk::constants::GLOBAL_REQUEST_ID) for
/// session-state events owned by no particular call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub request_id: i64,
    pub completion: Completion,
}

impl EventRecord {
    pub fn new(request_id: i64, completion: Completion) -> Self {
        EventRecord {
            request_id,
            completion,
        }
    }

    pub fn kind(&self) -> CompletionKind {
        self.completion.kind()
    }

    pub fn result_code(&self) -> Option<i32> {
        self.completion.result_code()
    }
}
