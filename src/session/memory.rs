//! In-process coordination service
//!
//! A minimal single-machine implementation of the `Session`/`Connector`
//! contract: hierarchical namespace, atomic create-if-absent, per-parent
//! sequence counters, ephemeral ownership, one-shot deletion watches and
//! session-state events. Good for tests and embedded setups; a wire-protocol
//! client to a real ensemble would implement the same traits.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::common::{paths, Error, Result};
use crate::session::event::{SessionState, WatchedEvent};
use crate::session::{Acl, Connector, CreateMode, Session, Watcher};

struct Node {
    data: Vec<u8>,
    /// Owning session id for ephemeral nodes
    owner: Option<u64>,
    /// Next sequence suffix handed out under this parent
    next_sequence: u64,
    /// Sessions holding a one-shot deletion watch on this node
    watches: Vec<u64>,
}

impl Node {
    fn new(data: Vec<u8>, owner: Option<u64>) -> Self {
        Self {
            data,
            owner,
            next_sequence: 0,
            watches: Vec::new(),
        }
    }
}

struct SessionRecord {
    watcher: Arc<dyn Watcher>,
    alive: bool,
}

struct ClusterState {
    /// Full path -> node; BTreeMap keeps children enumerable by prefix range
    nodes: BTreeMap<String, Node>,
    sessions: HashMap<u64, SessionRecord>,
    next_session_id: u64,
}

impl ClusterState {
    fn session_alive(&self, id: u64) -> Result<()> {
        match self.sessions.get(&id) {
            Some(record) if record.alive => Ok(()),
            Some(_) => Err(Error::SessionExpired),
            None => Err(Error::ConnectionLoss(format!("unknown session {}", id))),
        }
    }

    fn node_alive(&self, path: &str) -> Result<&Node> {
        self.nodes
            .get(path)
            .ok_or_else(|| Error::NoNode(path.to_string()))
    }

    fn child_names(&self, path: &str) -> Vec<String> {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .map(|(p, _)| &p[prefix.len()..])
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .map(str::to_string)
            .collect()
    }

    /// Remove a node, returning the deletion events owed to watching sessions.
    fn remove_node(&mut self, path: &str) -> Vec<(Arc<dyn Watcher>, WatchedEvent)> {
        let mut fired = Vec::new();
        if let Some(node) = self.nodes.remove(path) {
            for session_id in node.watches {
                if let Some(record) = self.sessions.get(&session_id) {
                    if record.alive {
                        fired.push((record.watcher.clone(), WatchedEvent::node_deleted(path)));
                    }
                }
            }
        }
        fired
    }
}

/// Shared in-process namespace; hands out sessions through `Connector`.
#[derive(Clone)]
pub struct MemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCluster {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::new(Vec::new(), None));
        Self {
            state: Arc::new(Mutex::new(ClusterState {
                nodes,
                sessions: HashMap::new(),
                next_session_id: 1,
            })),
        }
    }

    /// Expire a session: reap its ephemeral nodes, fire their deletion
    /// watches, and deliver a `Disconnected` session event to its watcher.
    /// Session ids are assigned in connect order starting at 1.
    pub async fn expire_session(&self, session_id: u64) {
        let mut fired = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            let Some(record) = state.sessions.get_mut(&session_id) else {
                return;
            };
            if !record.alive {
                return;
            }
            record.alive = false;
            let watcher = record.watcher.clone();

            let owned: Vec<String> = state
                .nodes
                .iter()
                .filter(|(_, n)| n.owner == Some(session_id))
                .map(|(p, _)| p.clone())
                .collect();
            for path in owned {
                fired.extend(state.remove_node(&path));
            }
            fired.push((
                watcher,
                WatchedEvent::session(SessionState::Disconnected),
            ));
        }
        // Lock released before delivery: handlers may reconnect into this cluster.
        for (watcher, event) in fired {
            watcher.process(event).await;
        }
    }

    /// Child names under `path`, for test assertions.
    pub fn snapshot_children(&self, path: &str) -> Vec<String> {
        let mut names = self.state.lock().unwrap().child_names(path);
        names.sort();
        names
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }
}

#[async_trait]
impl Connector for MemoryCluster {
    async fn connect(&self, watcher: Arc<dyn Watcher>) -> Result<Arc<dyn Session>> {
        let (id, watcher_for_event) = {
            let mut state = self.state.lock().unwrap();
            let id = state.next_session_id;
            state.next_session_id += 1;
            state.sessions.insert(
                id,
                SessionRecord {
                    watcher: watcher.clone(),
                    alive: true,
                },
            );
            (id, watcher)
        };
        tracing::debug!("Session {} established", id);

        // The service reports SyncConnected out of band, never inside connect.
        tokio::spawn(async move {
            watcher_for_event
                .process(WatchedEvent::session(SessionState::Connected))
                .await;
        });

        Ok(Arc::new(MemorySession {
            state: self.state.clone(),
            id,
        }))
    }
}

/// One client session against a `MemoryCluster`.
pub struct MemorySession {
    state: Arc<Mutex<ClusterState>>,
    id: u64,
}

impl MemorySession {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn exists(&self, path: &str) -> Result<bool> {
        paths::validate(path)?;
        let state = self.state.lock().unwrap();
        state.session_alive(self.id)?;
        Ok(state.nodes.contains_key(path))
    }

    async fn create(
        &self,
        path: &str,
        data: Vec<u8>,
        _acl: Acl,
        mode: CreateMode,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.session_alive(self.id)?;

        let (actual, owner) = match mode {
            CreateMode::Persistent => {
                paths::validate(path)?;
                if state.nodes.contains_key(path) {
                    return Err(Error::NodeExists(path.to_string()));
                }
                (path.to_string(), None)
            }
            CreateMode::EphemeralSequential => {
                // `path` is a prefix; the assigned suffix completes the name.
                let parent = paths::parent_of(path)
                    .ok_or_else(|| Error::InvalidPath(path.to_string()))?
                    .to_string();
                let node = state
                    .nodes
                    .get_mut(&parent)
                    .ok_or_else(|| Error::NoNode(parent.clone()))?;
                let sequence = node.next_sequence;
                node.next_sequence += 1;
                (
                    format!(
                        "{}{:0width$}",
                        path,
                        sequence,
                        width = paths::SEQUENCE_WIDTH
                    ),
                    Some(self.id),
                )
            }
        };

        let parent = paths::parent_of(&actual)
            .ok_or_else(|| Error::InvalidPath(actual.clone()))?;
        if !state.nodes.contains_key(parent) {
            return Err(Error::NoNode(parent.to_string()));
        }

        tracing::debug!("Session {} created {}", self.id, actual);
        state.nodes.insert(actual.clone(), Node::new(data, owner));
        Ok(actual)
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        paths::validate(path)?;
        let state = self.state.lock().unwrap();
        state.session_alive(self.id)?;
        state.node_alive(path)?;
        Ok(state.child_names(path))
    }

    async fn get_data(&self, path: &str, watch: bool) -> Result<Vec<u8>> {
        paths::validate(path)?;
        let mut state = self.state.lock().unwrap();
        state.session_alive(self.id)?;
        let id = self.id;
        let node = state
            .nodes
            .get_mut(path)
            .ok_or_else(|| Error::NoNode(path.to_string()))?;
        if watch && !node.watches.contains(&id) {
            node.watches.push(id);
        }
        Ok(node.data.clone())
    }

    async fn close(&self) -> Result<()> {
        let fired = {
            let mut state = self.state.lock().unwrap();
            let Some(record) = state.sessions.get_mut(&self.id) else {
                return Ok(());
            };
            if !record.alive {
                return Ok(());
            }
            record.alive = false;

            let owned: Vec<String> = state
                .nodes
                .iter()
                .filter(|(_, n)| n.owner == Some(self.id))
                .map(|(p, _)| p.clone())
                .collect();
            let mut fired = Vec::new();
            for path in owned {
                fired.extend(state.remove_node(&path));
            }
            fired
        };
        tracing::debug!("Session {} closed", self.id);
        // Graceful close: others learn through their deletion watches, the
        // closing client gets no session event.
        for (watcher, event) in fired {
            watcher.process(event).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullWatcher;

    #[async_trait]
    impl Watcher for NullWatcher {
        async fn process(&self, _event: WatchedEvent) {}
    }

    struct CountingWatcher {
        deletions: AtomicUsize,
    }

    #[async_trait]
    impl Watcher for CountingWatcher {
        async fn process(&self, event: WatchedEvent) {
            if event.kind == crate::session::EventKind::NodeDeleted {
                self.deletions.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_create_and_children() {
        let cluster = MemoryCluster::new();
        let session = cluster.connect(Arc::new(NullWatcher)).await.unwrap();

        session
            .create("/ELECTION", b"/ELECTION".to_vec(), Acl::default(), CreateMode::Persistent)
            .await
            .unwrap();
        session
            .create("/ELECTION/g", Vec::new(), Acl::default(), CreateMode::Persistent)
            .await
            .unwrap();

        let first = session
            .create("/ELECTION/g/n_", b"a".to_vec(), Acl::default(), CreateMode::EphemeralSequential)
            .await
            .unwrap();
        let second = session
            .create("/ELECTION/g/n_", b"b".to_vec(), Acl::default(), CreateMode::EphemeralSequential)
            .await
            .unwrap();

        assert_eq!(first, "/ELECTION/g/n_0000000000");
        assert_eq!(second, "/ELECTION/g/n_0000000001");
        assert_eq!(
            session.children("/ELECTION/g").await.unwrap().len(),
            2
        );
        // Grandchildren are not children of the root
        assert_eq!(session.children("/ELECTION").await.unwrap(), vec!["g"]);
    }

    #[tokio::test]
    async fn test_duplicate_persistent_create_fails() {
        let cluster = MemoryCluster::new();
        let session = cluster.connect(Arc::new(NullWatcher)).await.unwrap();
        session
            .create("/ELECTION", Vec::new(), Acl::default(), CreateMode::Persistent)
            .await
            .unwrap();
        let err = session
            .create("/ELECTION", Vec::new(), Acl::default(), CreateMode::Persistent)
            .await
            .unwrap_err();
        assert!(err.is_node_exists());
    }

    #[tokio::test]
    async fn test_create_under_missing_parent_fails() {
        let cluster = MemoryCluster::new();
        let session = cluster.connect(Arc::new(NullWatcher)).await.unwrap();
        let err = session
            .create("/ELECTION/g/n_", Vec::new(), Acl::default(), CreateMode::EphemeralSequential)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoNode(_)));
    }

    #[tokio::test]
    async fn test_expiry_reaps_ephemerals_and_fires_watches() {
        let cluster = MemoryCluster::new();
        let owner = cluster.connect(Arc::new(NullWatcher)).await.unwrap();
        let observer_watcher = Arc::new(CountingWatcher {
            deletions: AtomicUsize::new(0),
        });
        let observer = cluster.connect(observer_watcher.clone()).await.unwrap();

        owner
            .create("/ELECTION", Vec::new(), Acl::default(), CreateMode::Persistent)
            .await
            .unwrap();
        let member = owner
            .create("/ELECTION/n_", b"a".to_vec(), Acl::default(), CreateMode::EphemeralSequential)
            .await
            .unwrap();

        // Observer arms a one-shot deletion watch
        observer.get_data(&member, true).await.unwrap();

        cluster.expire_session(1).await;

        assert_eq!(observer_watcher.deletions.load(Ordering::SeqCst), 1);
        assert!(!observer.exists(&member).await.unwrap());
        // Persistent node survives its creator
        assert!(observer.exists("/ELECTION").await.unwrap());
        // The dead session is unusable
        assert!(owner.exists("/ELECTION").await.is_err());
    }

    #[tokio::test]
    async fn test_sequence_never_reused_after_expiry() {
        let cluster = MemoryCluster::new();
        let first = cluster.connect(Arc::new(NullWatcher)).await.unwrap();
        first
            .create("/ELECTION", Vec::new(), Acl::default(), CreateMode::Persistent)
            .await
            .unwrap();
        let a = first
            .create("/ELECTION/n_", b"a".to_vec(), Acl::default(), CreateMode::EphemeralSequential)
            .await
            .unwrap();
        cluster.expire_session(1).await;

        let second = cluster.connect(Arc::new(NullWatcher)).await.unwrap();
        let b = second
            .create("/ELECTION/n_", b"a".to_vec(), Acl::default(), CreateMode::EphemeralSequential)
            .await
            .unwrap();
        assert!(b > a, "fresh registration must get a higher sequence");
    }
}
