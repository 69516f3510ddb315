//! Election coordinator
//!
//! Owns the per-group election state machine: one-time namespace bootstrap,
//! ephemeral-sequential membership registration, leadership verdicts by
//! minimum sequence suffix, a per-candidate verdict cache, and the watch
//! handling that invalidates the cache and re-bootstraps after reconnection.
//!
//! Leadership rule: among the live membership nodes under
//! `/ELECTION/<group>`, the candidate whose node carries the smallest
//! sequence suffix is the leader. The coordination service's ordering
//! guarantee for sequence suffixes is the only source of truth; no lock of
//! our own is held across processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::common::{paths, Result};
use crate::election::client::CoordinationClient;
use crate::session::{Acl, CreateMode, EventKind, SessionState, WatchedEvent, Watcher};

/// Bootstrap flags and verdict cache, all mutations behind one lock.
/// The guard is never held across an await.
#[derive(Default)]
struct ElectionState {
    /// `/ELECTION` known to exist
    root_ready: bool,
    /// Group node exists and our membership node is registered
    service_ready: bool,
    /// Candidate name -> last known verdict; trustworthy only until the next
    /// watch-triggered invalidation
    leaders: HashMap<String, bool>,
}

pub struct ElectionCoordinator {
    client: Arc<CoordinationClient>,
    group: String,
    state: Mutex<ElectionState>,
}

impl ElectionCoordinator {
    /// Build the coordinator and establish the first session, registering
    /// it as the watcher. Connect failures are fatal to the caller.
    pub async fn connect(
        client: Arc<CoordinationClient>,
        group: impl Into<String>,
    ) -> Result<Arc<Self>> {
        let coordinator = Arc::new(Self {
            client,
            group: group.into(),
            state: Mutex::new(ElectionState::default()),
        });
        let watcher: Arc<dyn Watcher> = coordinator.clone();
        coordinator.client.connect(watcher).await?;
        Ok(coordinator)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Is `candidate` currently the leader of its group?
    ///
    /// Returns the cached verdict when one is present, otherwise runs a full
    /// `check_leader`. Never errors: an unverifiable candidate is a follower.
    pub async fn is_leader(&self, candidate: &str) -> bool {
        if let Some(&verdict) = self.state.lock().unwrap().leaders.get(candidate) {
            return verdict;
        }
        self.check_leader(candidate).await
    }

    /// Run the full protocol step and cache the verdict.
    ///
    /// Any steady-state failure downgrades to `false`: a candidate must
    /// never assume leadership on an uncertain read.
    pub async fn check_leader(&self, candidate: &str) -> bool {
        match self.try_check_leader(candidate).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(
                    "Leader check failed for {} in group {}: {}",
                    candidate,
                    self.group,
                    e
                );
                false
            }
        }
    }

    /// The fallible protocol step; `check_leader` applies the fail-safe.
    async fn try_check_leader(&self, candidate: &str) -> Result<bool> {
        if !self.state.lock().unwrap().root_ready {
            self.bootstrap_root().await?;
        }

        let service_path = paths::group_path(&self.group);

        if !self.state.lock().unwrap().service_ready {
            self.register_membership(&service_path, candidate).await?;
        }

        let leader = self.client.leader_metadata(&service_path).await?;
        let verdict = leader == candidate;
        self.state
            .lock()
            .unwrap()
            .leaders
            .insert(candidate.to_string(), verdict);
        tracing::debug!(
            "Group {}: leader is {}, {} {} leading",
            self.group,
            leader,
            candidate,
            if verdict { "is" } else { "is not" }
        );
        Ok(verdict)
    }

    /// Create `/ELECTION` if absent and mark the root ready.
    async fn bootstrap_root(&self) -> Result<()> {
        self.client
            .ensure_node_exists(
                paths::ELECTION_ROOT,
                paths::ELECTION_ROOT,
                Acl::default(),
                CreateMode::Persistent,
            )
            .await?;
        self.state.lock().unwrap().root_ready = true;
        Ok(())
    }

    /// Create the group node if absent, then register a fresh membership
    /// node carrying `candidate` as payload. Runs exactly once per session:
    /// repeating it would create duplicate nodes and corrupt the ordering.
    async fn register_membership(&self, service_path: &str, candidate: &str) -> Result<()> {
        self.client
            .ensure_node_exists(service_path, service_path, Acl::default(), CreateMode::Persistent)
            .await?;
        let member = self
            .client
            .create_node(
                &paths::member_prefix_path(&self.group),
                candidate,
                Acl::default(),
                CreateMode::EphemeralSequential,
            )
            .await?;
        self.state.lock().unwrap().service_ready = true;
        tracing::info!("Registered {} as {}", candidate, member);
        Ok(())
    }
}

#[async_trait]
impl Watcher for ElectionCoordinator {
    async fn process(&self, event: WatchedEvent) {
        match event.kind {
            // The watched leader node went away. Any membership change can
            // change the minimum, so drop every cached verdict.
            EventKind::NodeDeleted => {
                tracing::debug!(
                    "Group {}: watched node {:?} deleted, invalidating cache",
                    self.group,
                    event.path
                );
                self.state.lock().unwrap().leaders.clear();
            }
            EventKind::None if event.state == SessionState::Connected => {
                // First connect or reconnect: re-run the root bootstrap.
                if let Err(e) = self.bootstrap_root().await {
                    tracing::warn!("Root bootstrap after connect failed: {}", e);
                }
            }
            EventKind::None if event.state.is_lost() => {
                tracing::warn!(
                    "Group {}: session {}, re-registering on next check",
                    self.group,
                    event.state
                );
                {
                    // The old membership node died with the session; both
                    // flags and the cache are stale together.
                    let mut state = self.state.lock().unwrap();
                    state.root_ready = false;
                    state.service_ready = false;
                    state.leaders.clear();
                }
                if let Err(e) = self.client.reconnect().await {
                    tracing::warn!("Reconnect failed: {}", e);
                }
            }
            // Unrecognized events carry no leadership information.
            _ => {}
        }
    }
}
