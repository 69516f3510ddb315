//! # minielect
//!
//! Leader election over a ZooKeeper-style coordination service:
//! - ephemeral-sequential membership nodes, smallest suffix wins
//! - per-candidate verdict cache invalidated by deletion watches
//! - automatic re-bootstrap and re-registration after session loss
//! - conservative fail-safe: an unverifiable candidate is a follower
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        Coordination service              │
//! │  /ELECTION/<group>/n_<sequence>          │
//! │  (ephemeral-sequential, payload = name)  │
//! └───────────┬──────────────────────────────┘
//!             │ Session / Connector traits
//! ┌───────────▼──────────────┐
//! │   CoordinationClient     │  four primitives, fail-fast, no retries
//! └───────────┬──────────────┘
//! ┌───────────▼──────────────┐
//! │   ElectionCoordinator    │  bootstrap, registration, cache, watches
//! └──────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use minielect::{CoordinationClient, ElectionCoordinator, MemoryCluster};
//!
//! # async fn demo() -> minielect::Result<()> {
//! let cluster = MemoryCluster::new();
//! let client = Arc::new(CoordinationClient::new(Arc::new(cluster)));
//! let election = ElectionCoordinator::connect(client, "WorkerService").await?;
//!
//! if election.is_leader("candidate-1").await {
//!     // do leader-only work
//! }
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod election;
pub mod session;

// Re-export commonly used types
pub use common::{ElectionConfig, Error, Result};
pub use election::{CoordinationClient, ElectionCoordinator};
pub use session::{MemoryCluster, Watcher};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
