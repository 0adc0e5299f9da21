//! Client-library constants
//!
//! This module centralizes the integer vocabulary shared with the external
//! client library: status codes, watch event types, session states, ACL
//! permission bits and create flags. The bridge never interprets status
//! codes beyond equality checks; they travel through event records as
//! opaque values. But naming the well-known ones keeps tests and
//! diagnostics readable.

use once_cell::sync::Lazy;

use crate::zk::event::AclEntry;

// ===== Request correlation =====

/// Reserved request id for session/state events not tied to any call.
///
/// The persistent session-watcher context carries this id; dispatch rejects
/// it for ordinary calls so an event's origin is never ambiguous.
pub const GLOBAL_REQUEST_ID: i64 = -1;

// ===== Status codes =====
// Everything here mirrors the external library's error table. 0 is success,
// system errors are small negatives, API errors start at -100.

/// Operation completed successfully
pub const ZOK: i32 = 0;

/// Generic system error (also the threshold value for the system range)
pub const ZSYSTEMERROR: i32 = -1;
/// A runtime inconsistency was found
pub const ZRUNTIMEINCONSISTENCY: i32 = -2;
/// A data inconsistency was found
pub const ZDATAINCONSISTENCY: i32 = -3;
/// Connection to the server has been lost
pub const ZCONNECTIONLOSS: i32 = -4;
/// Error while marshalling or unmarshalling data
pub const ZMARSHALLINGERROR: i32 = -5;
/// Operation is unimplemented
pub const ZUNIMPLEMENTED: i32 = -6;
/// Operation timeout
pub const ZOPERATIONTIMEOUT: i32 = -7;
/// Invalid arguments
pub const ZBADARGUMENTS: i32 = -8;
/// Invalid handle state
pub const ZINVALIDSTATE: i32 = -9;

/// Generic API error (also the threshold value for the API range)
pub const ZAPIERROR: i32 = -100;
/// Node does not exist
pub const ZNONODE: i32 = -101;
/// Not authenticated
pub const ZNOAUTH: i32 = -102;
/// Version conflict
pub const ZBADVERSION: i32 = -103;
/// Ephemeral nodes may not have children
pub const ZNOCHILDRENFOREPHEMERALS: i32 = -108;
/// The node already exists
pub const ZNODEEXISTS: i32 = -110;
/// The node has children
pub const ZNOTEMPTY: i32 = -111;
/// The session has been expired by the server
pub const ZSESSIONEXPIRED: i32 = -112;
/// Invalid callback specified
pub const ZINVALIDCALLBACK: i32 = -113;
/// Invalid ACL specified
pub const ZINVALIDACL: i32 = -114;
/// Client authentication failed
pub const ZAUTHFAILED: i32 = -115;
/// The session is being closed
pub const ZCLOSING: i32 = -116;
/// No server responses to process
pub const ZNOTHING: i32 = -117;
/// The session moved to another server
pub const ZSESSIONMOVED: i32 = -118;

// ===== Watch event types =====

/// A node was created
pub const CREATED_EVENT: i32 = 1;
/// A node was deleted
pub const DELETED_EVENT: i32 = 2;
/// A node's data changed
pub const CHANGED_EVENT: i32 = 3;
/// A node's children changed
pub const CHILD_EVENT: i32 = 4;
/// Session-state transition (connect, disconnect, expiry)
pub const SESSION_EVENT: i32 = -1;
/// The server will no longer deliver this watch
pub const NOTWATCHING_EVENT: i32 = -2;

// ===== Session states =====

/// The session expired
pub const EXPIRED_SESSION_STATE: i32 = -112;
/// Authentication failed
pub const AUTH_FAILED_STATE: i32 = -113;
/// Still negotiating a connection
pub const CONNECTING_STATE: i32 = 1;
/// Associating with a session
pub const ASSOCIATING_STATE: i32 = 2;
/// Connected and usable
pub const CONNECTED_STATE: i32 = 3;

// ===== ACL permission bits =====

pub const PERM_READ: i32 = 1 << 0;
pub const PERM_WRITE: i32 = 1 << 1;
pub const PERM_CREATE: i32 = 1 << 2;
pub const PERM_DELETE: i32 = 1 << 3;
pub const PERM_ADMIN: i32 = 1 << 4;
pub const PERM_ALL: i32 = PERM_READ | PERM_WRITE | PERM_CREATE | PERM_DELETE | PERM_ADMIN;

// ===== Create flags =====

/// Node is deleted when the creating session ends
pub const FLAG_EPHEMERAL: i32 = 1;
/// Server appends a monotonically increasing counter to the path
pub const FLAG_SEQUENCE: i32 = 2;

// ===== Defaults and bounds =====

/// Connect string used when the embedder supplies none
pub const DEFAULT_HOSTS: &str = "127.0.0.1:2181";

/// Session receive timeout requested by default, in milliseconds
pub const DEFAULT_RECV_TIMEOUT_MS: u32 = 10_000;

/// Smallest receive timeout the bridge will request
pub const MIN_RECV_TIMEOUT_MS: u32 = 100;

/// Largest node payload accepted at dispatch time (1 MiB, the server's
/// historical jute.maxbuffer limit)
pub const MAX_NODE_DATA_SIZE: usize = 1_048_576;

/// Capacity of the consumer wake channel.
///
/// Wake tokens are an edge signal, not a per-record count, so a small buffer
/// suffices; producers drop the token when the buffer is full and the
/// consumer still sees the records on its next drain.
pub const WAKE_BUFFER: usize = 64;

/// Length of a session secret, in bytes
pub const SESSION_PASSWD_LEN: usize = 16;

// ===== Canned ACL lists =====

/// World-readable-and-writable ACL ("anyone may do anything")
pub static OPEN_ACL_UNSAFE: Lazy<Vec<AclEntry>> =
    Lazy::new(|| vec![AclEntry::world_anyone(PERM_ALL)]);

/// World-readable ACL
pub static READ_ACL_UNSAFE: Lazy<Vec<AclEntry>> =
    Lazy::new(|| vec![AclEntry::world_anyone(PERM_READ)]);

/// Full permissions for the authenticated identity that creates the node
pub static CREATOR_ALL_ACL: Lazy<Vec<AclEntry>> =
    Lazy::new(|| vec![AclEntry::new(PERM_ALL, "auth", "")]);

/// Human-readable rendering of a well-known status code, for diagnostics
/// only; the bridge never branches on the text.
pub fn status_message(rc: i32) -> &'static str {
    match rc {
        ZOK => "ok",
        ZSYSTEMERROR => "system error",
        ZRUNTIMEINCONSISTENCY => "runtime inconsistency",
        ZDATAINCONSISTENCY => "data inconsistency",
        ZCONNECTIONLOSS => "connection loss",
        ZMARSHALLINGERROR => "marshalling error",
        ZUNIMPLEMENTED => "unimplemented",
        ZOPERATIONTIMEOUT => "operation timeout",
        ZBADARGUMENTS => "bad arguments",
        ZINVALIDSTATE => "invalid handle state",
        ZAPIERROR => "api error",
        ZNONODE => "no node",
        ZNOAUTH => "not authenticated",
        ZBADVERSION => "bad version",
        ZNOCHILDRENFOREPHEMERALS => "no children for ephemerals",
        ZNODEEXISTS => "node exists",
        ZNOTEMPTY => "not empty",
        ZSESSIONEXPIRED => "session expired",
        ZINVALIDCALLBACK => "invalid callback",
        ZINVALIDACL => "invalid acl",
        ZAUTHFAILED => "authentication failed",
        ZCLOSING => "session closing",
        ZNOTHING => "nothing to process",
        ZSESSIONMOVED => "session moved",
        _ => "unknown status",
    }
}
