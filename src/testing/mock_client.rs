//! In-memory mock of the external client library
//!
//! Implements `ZooKeeperClient` over a `BTreeMap` znode tree with enough
//! semantics for realistic scenarios: version checks, sequence-suffixed
//! creates, one-shot watches that fire before any later operation's
//! completion, and a session watcher that announces the initial connection.
//!
//! Two delivery modes mirror the two library builds:
//! - `Threaded`: one worker thread executes operations in submission order
//!   and invokes callbacks from there, the "arbitrary internal thread" of
//!   the real multi-threaded library.
//! - `Inline`: asynchronous work queues up and runs only inside
//!   `process_io`, modeling the single-threaded cooperative build.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;

use crate::zk::client::{
    AclCallback, DataCallback, SessionCredentials, StatCallback, StringCallback,
    StringsCallback, StringsStatCallback, VoidCallback, WatchCallback, ZooKeeperClient,
};
use crate::zk::constants::{
    CHANGED_EVENT, CHILD_EVENT, CONNECTED_STATE, CREATED_EVENT, DELETED_EVENT, FLAG_EPHEMERAL,
    FLAG_SEQUENCE, SESSION_EVENT, ZBADVERSION, ZNODEEXISTS, ZNONODE, ZOK,
};
use crate::zk::event::{AclEntry, Stat};

/// How the mock hands callbacks back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Callbacks fire on a dedicated worker thread
    Threaded,
    /// Async work is deferred until `process_io`
    Inline,
}

type Job = Box<dyn FnOnce() + Send>;

struct MockNode {
    data: Option<Vec<u8>>,
    acl: Vec<AclEntry>,
    stat: Stat,
}

#[derive(Default)]
struct Store {
    nodes: BTreeMap<String, MockNode>,
    next_zxid: i64,
    sequence: u64,
    exists_watches: HashMap<String, Vec<WatchCallback>>,
    data_watches: HashMap<String, Vec<WatchCallback>>,
    child_watches: HashMap<String, Vec<WatchCallback>>,
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn last_segment(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// One-shot node watches: take them out of the map, fire, drop
fn fire_node_watches(store: &mut Store, path: &str, event_type: i32) {
    let mut fired: Vec<WatchCallback> = Vec::new();
    if let Some(watches) = store.exists_watches.remove(path) {
        fired.extend(watches);
    }
    if let Some(watches) = store.data_watches.remove(path) {
        fired.extend(watches);
    }
    for mut watch in fired {
        watch(event_type, CONNECTED_STATE, Some(path));
    }
}

fn fire_child_watches(store: &mut Store, parent: &str) {
    if let Some(watches) = store.child_watches.remove(parent) {
        for mut watch in watches {
            watch(CHILD_EVENT, CONNECTED_STATE, Some(parent));
        }
    }
}

/// Shared state of the mock, kept alive by tests for post-close assertions
pub struct MockCore {
    store: Mutex<Store>,
    /// Inline-mode deferred jobs, drained by `process_io`
    pending: Mutex<VecDeque<Job>>,
    session_watcher: Mutex<Option<WatchCallback>>,
    teardown: Mutex<Vec<&'static str>>,
    session: SessionCredentials,
}

impl MockCore {
    fn new() -> Self {
        MockCore {
            store: Mutex::new(Store::default()),
            pending: Mutex::new(VecDeque::new()),
            session_watcher: Mutex::new(None),
            teardown: Mutex::new(Vec::new()),
            session: SessionCredentials::new(0x00c0_ffee, *b"mock-session-pw!"),
        }
    }

    /// Order of teardown-relevant calls: "sever" and/or "close"
    pub fn teardown_log(&self) -> Vec<&'static str> {
        self.teardown.lock().clone()
    }

    pub fn session_id(&self) -> i64 {
        self.session.session_id
    }

    /// Push a session-state transition through the session watcher, as the
    /// real library does from its I/O thread
    pub fn fire_session_event(&self, state: i32) {
        if let Some(watcher) = self.session_watcher.lock().as_mut() {
            watcher(SESSION_EVENT, state, None);
        }
    }

    // ----- znode-tree operations -----

    fn do_create(
        &self,
        path: &str,
        data: Option<&[u8]>,
        acl: &[AclEntry],
        flags: i32,
    ) -> (i32, Option<String>) {
        let mut store = self.store.lock();
        let final_path = if flags & FLAG_SEQUENCE != 0 {
            store.sequence += 1;
            format!("{}{:010}", path, store.sequence)
        } else {
            path.to_string()
        };
        if store.nodes.contains_key(&final_path) {
            return (ZNODEEXISTS, None);
        }
        let parent = parent_of(&final_path).to_string();
        if parent != "/" && !store.nodes.contains_key(&parent) {
            return (ZNONODE, None);
        }
        store.next_zxid += 1;
        let zxid = store.next_zxid;
        let stat = Stat {
            czxid: zxid,
            mzxid: zxid,
            pzxid: zxid,
            data_length: data.map_or(0, |d| d.len() as i32),
            ephemeral_owner: if flags & FLAG_EPHEMERAL != 0 {
                self.session.session_id
            } else {
                0
            },
            ..Stat::default()
        };
        store.nodes.insert(
            final_path.clone(),
            MockNode {
                data: data.map(<[u8]>::to_vec),
                acl: acl.to_vec(),
                stat,
            },
        );
        if let Some(parent_node) = store.nodes.get_mut(&parent) {
            parent_node.stat.cversion += 1;
            parent_node.stat.num_children += 1;
            parent_node.stat.pzxid = zxid;
        }
        fire_node_watches(&mut store, &final_path, CREATED_EVENT);
        fire_child_watches(&mut store, &parent);
        (ZOK, Some(final_path))
    }

    fn do_delete(&self, path: &str, version: i32) -> i32 {
        let mut store = self.store.lock();
        match store.nodes.get(path) {
            None => return ZNONODE,
            Some(node) => {
                if version >= 0 && node.stat.version != version {
                    return ZBADVERSION;
                }
            }
        }
        store.nodes.remove(path);
        store.next_zxid += 1;
        let zxid = store.next_zxid;
        let parent = parent_of(path).to_string();
        if let Some(parent_node) = store.nodes.get_mut(&parent) {
            parent_node.stat.cversion += 1;
            parent_node.stat.num_children -= 1;
            parent_node.stat.pzxid = zxid;
        }
        fire_node_watches(&mut store, path, DELETED_EVENT);
        fire_child_watches(&mut store, &parent);
        ZOK
    }

    fn do_exists(&self, path: &str, watch: Option<WatchCallback>) -> (i32, Option<Stat>) {
        let mut store = self.store.lock();
        // Exists watches may target nodes that do not exist yet.
        if let Some(watch) = watch {
            store
                .exists_watches
                .entry(path.to_string())
                .or_default()
                .push(watch);
        }
        match store.nodes.get(path) {
            Some(node) => (ZOK, Some(node.stat)),
            None => (ZNONODE, None),
        }
    }

    fn do_get(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<u8>>, Option<Stat>) {
        let mut store = self.store.lock();
        if !store.nodes.contains_key(path) {
            return (ZNONODE, None, None);
        }
        if let Some(watch) = watch {
            store
                .data_watches
                .entry(path.to_string())
                .or_default()
                .push(watch);
        }
        let node = &store.nodes[path];
        (ZOK, node.data.clone(), Some(node.stat))
    }

    fn do_set(&self, path: &str, data: Option<&[u8]>, version: i32) -> (i32, Option<Stat>) {
        let mut store = self.store.lock();
        match store.nodes.get(path) {
            None => return (ZNONODE, None),
            Some(node) => {
                if version >= 0 && node.stat.version != version {
                    return (ZBADVERSION, None);
                }
            }
        }
        store.next_zxid += 1;
        let zxid = store.next_zxid;
        let stat = {
            let node = store.nodes.get_mut(path).expect("checked above");
            node.data = data.map(<[u8]>::to_vec);
            node.stat.version += 1;
            node.stat.mzxid = zxid;
            node.stat.data_length = data.map_or(0, |d| d.len() as i32);
            node.stat
        };
        fire_node_watches(&mut store, path, CHANGED_EVENT);
        (ZOK, Some(stat))
    }

    fn do_get_children(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<Vec<u8>>>, Option<Stat>) {
        let mut store = self.store.lock();
        if !store.nodes.contains_key(path) {
            return (ZNONODE, None, None);
        }
        if let Some(watch) = watch {
            store
                .child_watches
                .entry(path.to_string())
                .or_default()
                .push(watch);
        }
        let names = store
            .nodes
            .keys()
            .filter(|key| parent_of(key) == path)
            .map(|key| last_segment(key).as_bytes().to_vec())
            .collect();
        (ZOK, Some(names), Some(store.nodes[path].stat))
    }

    fn do_get_acl(&self, path: &str) -> (i32, Option<Vec<AclEntry>>, Option<Stat>) {
        let store = self.store.lock();
        match store.nodes.get(path) {
            Some(node) => (ZOK, Some(node.acl.clone()), Some(node.stat)),
            None => (ZNONODE, None, None),
        }
    }

    fn do_set_acl(&self, path: &str, acl: &[AclEntry], version: i32) -> i32 {
        let mut store = self.store.lock();
        match store.nodes.get_mut(path) {
            None => ZNONODE,
            Some(node) => {
                if version >= 0 && node.stat.aversion != version {
                    return ZBADVERSION;
                }
                node.acl = acl.to_vec();
                node.stat.aversion += 1;
                ZOK
            }
        }
    }
}

/// The mock client handed to `ZkHandle::connect`
pub struct MockZooKeeper {
    core: Arc<MockCore>,
    delivery: Delivery,
    jobs_tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl MockZooKeeper {
    pub fn new(delivery: Delivery) -> Self {
        let core = Arc::new(MockCore::new());
        let (jobs_tx, worker) = match delivery {
            Delivery::Threaded => {
                let (tx, rx) = unbounded::<Job>();
                let handle = std::thread::spawn(move || {
                    for job in rx {
                        job();
                    }
                });
                (Some(tx), Some(handle))
            }
            Delivery::Inline => (None, None),
        };
        MockZooKeeper {
            core,
            delivery,
            jobs_tx,
            worker,
        }
    }

    pub fn core(&self) -> Arc<MockCore> {
        self.core.clone()
    }

    /// Install the session watcher and announce the initial connection, as
    /// the real library does once its session is established
    pub fn install_session_watcher(&self, watcher: WatchCallback) {
        *self.core.session_watcher.lock() = Some(watcher);
        let core = self.core.clone();
        self.submit(Box::new(move || core.fire_session_event(CONNECTED_STATE)));
    }

    fn submit(&self, job: Job) {
        match self.delivery {
            Delivery::Threaded => {
                if let Some(tx) = &self.jobs_tx {
                    let _ = tx.send(job);
                }
            }
            Delivery::Inline => self.core.pending.lock().push_back(job),
        }
    }
}

impl ZooKeeperClient for MockZooKeeper {
    fn create(
        &self,
        path: &str,
        data: Option<&[u8]>,
        acl: &[AclEntry],
        flags: i32,
    ) -> (i32, Option<String>) {
        self.core.do_create(path, data, acl, flags)
    }

    fn create_async(
        &self,
        path: &str,
        data: Option<&[u8]>,
        acl: &[AclEntry],
        flags: i32,
        completion: StringCallback,
    ) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        let data = data.map(<[u8]>::to_vec);
        let acl = acl.to_vec();
        self.submit(Box::new(move || {
            let (rc, created) = core.do_create(&path, data.as_deref(), &acl, flags);
            completion(rc, created.as_deref().map(str::as_bytes));
        }));
        ZOK
    }

    fn delete(&self, path: &str, version: i32) -> i32 {
        self.core.do_delete(path, version)
    }

    fn delete_async(&self, path: &str, version: i32, completion: VoidCallback) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        self.submit(Box::new(move || {
            completion(core.do_delete(&path, version));
        }));
        ZOK
    }

    fn exists(&self, path: &str, watch: Option<WatchCallback>) -> (i32, Option<Stat>) {
        self.core.do_exists(path, watch)
    }

    fn exists_async(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
        completion: StatCallback,
    ) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        self.submit(Box::new(move || {
            let (rc, stat) = core.do_exists(&path, watch);
            completion(rc, stat.as_ref());
        }));
        ZOK
    }

    fn get(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<u8>>, Option<Stat>) {
        self.core.do_get(path, watch)
    }

    fn get_async(&self, path: &str, watch: Option<WatchCallback>, completion: DataCallback) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        self.submit(Box::new(move || {
            let (rc, data, stat) = core.do_get(&path, watch);
            completion(rc, data.as_deref(), stat.as_ref());
        }));
        ZOK
    }

    fn set(&self, path: &str, data: Option<&[u8]>, version: i32) -> (i32, Option<Stat>) {
        self.core.do_set(path, data, version)
    }

    fn set_async(
        &self,
        path: &str,
        data: Option<&[u8]>,
        version: i32,
        completion: StatCallback,
    ) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        let data = data.map(<[u8]>::to_vec);
        self.submit(Box::new(move || {
            let (rc, stat) = core.do_set(&path, data.as_deref(), version);
            completion(rc, stat.as_ref());
        }));
        ZOK
    }

    fn get_children(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<Vec<u8>>>) {
        let (rc, values, _stat) = self.core.do_get_children(path, watch);
        (rc, values)
    }

    fn get_children_async(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
        completion: StringsCallback,
    ) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        self.submit(Box::new(move || {
            let (rc, values, _stat) = core.do_get_children(&path, watch);
            completion(rc, values.as_deref());
        }));
        ZOK
    }

    fn get_children_with_stat(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
    ) -> (i32, Option<Vec<Vec<u8>>>, Option<Stat>) {
        self.core.do_get_children(path, watch)
    }

    fn get_children_with_stat_async(
        &self,
        path: &str,
        watch: Option<WatchCallback>,
        completion: StringsStatCallback,
    ) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        self.submit(Box::new(move || {
            let (rc, values, stat) = core.do_get_children(&path, watch);
            completion(rc, values.as_deref(), stat.as_ref());
        }));
        ZOK
    }

    fn get_acl(&self, path: &str) -> (i32, Option<Vec<AclEntry>>, Option<Stat>) {
        self.core.do_get_acl(path)
    }

    fn get_acl_async(&self, path: &str, completion: AclCallback) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        self.submit(Box::new(move || {
            let (rc, acl, stat) = core.do_get_acl(&path);
            completion(rc, acl.as_deref(), stat.as_ref());
        }));
        ZOK
    }

    fn set_acl(&self, path: &str, acl: &[AclEntry], version: i32) -> i32 {
        self.core.do_set_acl(path, acl, version)
    }

    fn set_acl_async(
        &self,
        path: &str,
        acl: &[AclEntry],
        version: i32,
        completion: VoidCallback,
    ) -> i32 {
        let core = self.core.clone();
        let path = path.to_string();
        let acl = acl.to_vec();
        self.submit(Box::new(move || {
            completion(core.do_set_acl(&path, &acl, version));
        }));
        ZOK
    }

    fn add_auth_async(&self, _scheme: &str, _certificate: &[u8], completion: VoidCallback) -> i32 {
        self.submit(Box::new(move || completion(ZOK)));
        ZOK
    }

    fn sync_async(&self, path: &str, completion: StringCallback) -> i32 {
        let path = path.to_string();
        self.submit(Box::new(move || {
            completion(ZOK, Some(path.as_bytes()));
        }));
        ZOK
    }

    fn state(&self) -> i32 {
        CONNECTED_STATE
    }

    fn is_unrecoverable(&self) -> bool {
        false
    }

    fn client_id(&self) -> SessionCredentials {
        self.core.session
    }

    fn close(&mut self) -> i32 {
        self.core.teardown.lock().push("close");
        *self.core.session_watcher.lock() = None;
        // Let the worker finish in-flight callback deliveries, then stop.
        self.jobs_tx = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.core.pending.lock().clear();
        ZOK
    }

    fn sever_connection(&self) {
        self.core.teardown.lock().push("sever");
    }

    fn process_io(&self, _max_wait: Duration) -> i32 {
        // Inline mode: run everything deferred so far, in order. Jobs may
        // enqueue further events but never new jobs.
        loop {
            let job = self.core.pending.lock().pop_front();
            match job {
                Some(job) => job(),
                None => return ZOK,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zk::constants::PERM_ALL;

    #[test]
    fn test_mock_create_and_get() {
        let mock = MockZooKeeper::new(Delivery::Inline);
        let acl = vec![AclEntry::world_anyone(PERM_ALL)];
        let (rc, created) = mock.create("/n", Some(b"v"), &acl, 0);
        assert_eq!(rc, ZOK);
        assert_eq!(created.as_deref(), Some("/n"));

        let (rc, data, stat) = mock.get("/n", None);
        assert_eq!(rc, ZOK);
        assert_eq!(data.unwrap(), b"v".to_vec());
        assert_eq!(stat.unwrap().version, 0);
    }

    #[test]
    fn test_mock_version_checks() {
        let mock = MockZooKeeper::new(Delivery::Inline);
        let acl = vec![AclEntry::world_anyone(PERM_ALL)];
        mock.create("/v", Some(b"a"), &acl, 0);

        let (rc, _) = mock.set("/v", Some(b"b"), 5);
        assert_eq!(rc, ZBADVERSION);
        let (rc, stat) = mock.set("/v", Some(b"b"), 0);
        assert_eq!(rc, ZOK);
        assert_eq!(stat.unwrap().version, 1);
        assert_eq!(mock.delete("/v", 0), ZBADVERSION);
        assert_eq!(mock.delete("/v", 1), ZOK);
    }

    #[test]
    fn test_mock_create_missing_parent() {
        let mock = MockZooKeeper::new(Delivery::Inline);
        let acl = vec![AclEntry::world_anyone(PERM_ALL)];
        let (rc, created) = mock.create("/no/parent", None, &acl, 0);
        assert_eq!(rc, ZNONODE);
        assert!(created.is_none());
    }

    #[test]
    fn test_parent_helpers() {
        assert_eq!(parent_of("/a"), "/");
        assert_eq!(parent_of("/a/b"), "/a");
        assert_eq!(last_segment("/a/b"), "b");
    }
}
