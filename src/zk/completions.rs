// Completion adapters: one constructor per callback shape
//
// Each adapter turns a calling context into the boxed callback the client
// library wants, and every one of them does exactly the same four things:
// clone the borrowed arguments into owned memory, build the matching record
// variant, deliver it through the context, and let the context drop. The
// borrow-typed callback signatures make the copy unavoidable: there is no
// way to smuggle a library-owned pointer into the queue.
//
// Null arguments from the library stay absent (`None`); they are never
// turned into empty collections.

use std::sync::Arc;

use crate::zk::client::{
    AclCallback, DataCallback, StatCallback, StringCallback, StringsCallback,
    StringsStatCallback, VoidCallback, WatchCallback,
};
use crate::zk::context::CallingContext;
use crate::zk::event::{AclEntry, Completion};

/// Adapter for completions with no payload (delete, set_acl, add_auth)
pub(crate) fn void_adapter(ctx: CallingContext) -> VoidCallback {
    Box::new(move |rc| {
        ctx.deliver(Completion::Void { rc });
    })
}

/// Adapter for single-string completions (create, sync)
pub(crate) fn string_adapter(ctx: CallingContext) -> StringCallback {
    Box::new(move |rc, value| {
        ctx.deliver(Completion::String {
            rc,
            value: value.map(<[u8]>::to_vec),
        });
    })
}

/// Adapter for stat-only completions (exists, set)
pub(crate) fn stat_adapter(ctx: CallingContext) -> StatCallback {
    Box::new(move |rc, stat| {
        ctx.deliver(Completion::Stat {
            rc,
            stat: stat.copied(),
        });
    })
}

/// Adapter for data completions (get). The clone preserves the exact byte
/// length, embedded NULs included.
pub(crate) fn data_adapter(ctx: CallingContext) -> DataCallback {
    Box::new(move |rc, data, stat| {
        ctx.deliver(Completion::Data {
            rc,
            data: data.map(<[u8]>::to_vec),
            stat: stat.copied(),
        });
    })
}

/// Adapter for child-list completions (get_children)
pub(crate) fn strings_adapter(ctx: CallingContext) -> StringsCallback {
    Box::new(move |rc, values| {
        ctx.deliver(Completion::Strings {
            rc,
            values: values.map(<[Vec<u8>]>::to_vec),
        });
    })
}

/// Adapter for child-list-plus-stat completions
pub(crate) fn strings_stat_adapter(ctx: CallingContext) -> StringsStatCallback {
    Box::new(move |rc, values, stat| {
        ctx.deliver(Completion::StringsStat {
            rc,
            values: values.map(<[Vec<u8>]>::to_vec),
            stat: stat.copied(),
        });
    })
}

/// Adapter for ACL completions (get_acl)
pub(crate) fn acl_adapter(ctx: CallingContext) -> AclCallback {
    Box::new(move |rc, acl, stat| {
        ctx.deliver(Completion::Acl {
            rc,
            acl: acl.map(<[AclEntry]>::to_vec),
            stat: stat.copied(),
        });
    })
}

/// Adapter for a per-call watch registration. The closure owns its context;
/// the watch fires at most once and the context drops with the closure when
/// the library discards it.
pub(crate) fn watch_adapter(ctx: CallingContext) -> WatchCallback {
    Box::new(move |event_type, state, path| {
        ctx.deliver(Completion::Watcher {
            event_type,
            state,
            path: path.map(str::to_owned),
        });
    })
}

/// Adapter for the persistent session watcher. Shares the handle-owned
/// context instead of consuming one, so it survives arbitrarily many
/// state transitions.
pub(crate) fn session_watch_adapter(ctx: Arc<CallingContext>) -> WatchCallback {
    Box::new(move |event_type, state, path| {
        ctx.deliver(Completion::Watcher {
            event_type,
            state,
            path: path.map(str::to_owned),
        });
    })
}
