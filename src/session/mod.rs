//! Coordination service session abstraction
//!
//! The coordination service itself (consensus, replication, durability) is an
//! external collaborator. This module pins down the contract the election
//! layer relies on:
//! - a strongly-ordered hierarchical namespace
//! - atomic create-if-absent, with persistent vs ephemeral-sequential modes
//! - strictly increasing sequence suffixes per parent
//! - one-shot watches fired on node deletion and on session-state transitions
//!
//! `memory` provides an in-process implementation of the contract, good for
//! embedding in tests and single-machine setups. A wire-protocol backend
//! plugs in through the same two traits.

pub mod event;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::common::Result;

pub use event::{EventKind, SessionState, WatchedEvent};
pub use memory::{MemoryCluster, MemorySession};

/// Node creation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Survives the creating session
    Persistent,
    /// Dies with the creating session; name gains a service-assigned sequence suffix
    EphemeralSequential,
}

/// Access control on created nodes. This layer enforces none; everything is
/// created world-open, mirroring ZooKeeper's `OPEN_ACL_UNSAFE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acl {
    #[default]
    OpenUnrestricted,
}

/// Event sink registered at connect time. Implemented by the election
/// coordinator; injected, never subclassed.
#[async_trait]
pub trait Watcher: Send + Sync {
    async fn process(&self, event: WatchedEvent);
}

/// A live session with the coordination service.
///
/// Operations may suspend for network round trips; none of them retries.
/// Watches armed through `get_data` are one-shot and delivered to the watcher
/// the session was connected with.
#[async_trait]
pub trait Session: Send + Sync {
    /// Does a node exist at `path`?
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a node; returns the actual path, which for
    /// `CreateMode::EphemeralSequential` includes the assigned suffix.
    async fn create(&self, path: &str, data: Vec<u8>, acl: Acl, mode: CreateMode)
        -> Result<String>;

    /// Child names under `path`, in no guaranteed order.
    async fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Read a node's payload, optionally arming a one-shot deletion watch on it.
    async fn get_data(&self, path: &str, watch: bool) -> Result<Vec<u8>>;

    /// End the session; the service reaps every ephemeral node it owns.
    async fn close(&self) -> Result<()>;
}

/// Session factory addressed by a connect string; owns the session timeout.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, watcher: Arc<dyn Watcher>) -> Result<Arc<dyn Session>>;
}
