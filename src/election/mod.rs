//! Leader election over the coordination client boundary
//!
//! Two layers:
//! - `client` issues the four namespace primitives and holds the session
//! - `coordinator` runs the election protocol on top of them

pub mod client;
pub mod coordinator;

pub use client::CoordinationClient;
pub use coordinator::ElectionCoordinator;
