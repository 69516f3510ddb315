//! Coordination client boundary
//!
//! Thin wrapper around the live session handle. Four primitives, no election
//! logic: every operation fails fast with `Error::NotConnected` when no
//! session is held and never retries — retry policy belongs to the
//! election coordinator.

use std::sync::{Arc, Mutex};

use crate::common::{paths, Error, Result};
use crate::session::{Acl, Connector, CreateMode, Session, Watcher};

pub struct CoordinationClient {
    connector: Arc<dyn Connector>,
    session: Mutex<Option<Arc<dyn Session>>>,
    /// Watcher from the last connect, reused on reconnect
    watcher: Mutex<Option<Arc<dyn Watcher>>>,
}

impl CoordinationClient {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: Mutex::new(None),
            watcher: Mutex::new(None),
        }
    }

    /// Establish a session, registering `watcher` for all future events.
    /// Replaces any previous session handle. Failures propagate; nothing
    /// here retries.
    pub async fn connect(&self, watcher: Arc<dyn Watcher>) -> Result<()> {
        let session = self.connector.connect(watcher.clone()).await?;
        *self.watcher.lock().unwrap() = Some(watcher);
        *self.session.lock().unwrap() = Some(session);
        Ok(())
    }

    /// Re-establish a session with the watcher from the last `connect`.
    pub async fn reconnect(&self) -> Result<()> {
        let watcher = self
            .watcher
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::NotConnected)?;
        self.connect(watcher).await
    }

    /// End the current session, letting the service reap its ephemerals.
    pub async fn close(&self) -> Result<()> {
        let session = self.session.lock().unwrap().take();
        if let Some(session) = session {
            session.close().await?;
        }
        Ok(())
    }

    fn session(&self) -> Result<Arc<dyn Session>> {
        self.session
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::NotConnected)
    }

    /// Create `path` only if absent. A concurrent creation racing to the same
    /// path is success, not an error.
    pub async fn ensure_node_exists(
        &self,
        path: &str,
        data: &str,
        acl: Acl,
        mode: CreateMode,
    ) -> Result<()> {
        let session = self.session()?;
        if session.exists(path).await? {
            return Ok(());
        }
        match session
            .create(path, data.as_bytes().to_vec(), acl, mode)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_node_exists() => {
                tracing::debug!("Lost create race for {}, treating as success", path);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Unconditionally create a node; returns the actual path, sequence
    /// suffix included for ephemeral-sequential mode.
    pub async fn create_node(
        &self,
        path: &str,
        data: &str,
        acl: Acl,
        mode: CreateMode,
    ) -> Result<String> {
        let session = self.session()?;
        let actual = session
            .create(path, data.as_bytes().to_vec(), acl, mode)
            .await?;
        tracing::debug!("Created {} -> {}", path, actual);
        Ok(actual)
    }

    /// Payload of the lexicographically smallest child under `path`, with a
    /// one-shot deletion watch armed on that child. The payload is the
    /// leader's declared candidate name.
    pub async fn leader_metadata(&self, path: &str) -> Result<String> {
        let session = self.session()?;
        let mut children = session.children(path).await?;
        children.sort();
        let leader = children
            .first()
            .ok_or_else(|| Error::NoChildren(path.to_string()))?;

        let child_path = paths::join(path, leader);
        let data = session.get_data(&child_path, true).await?;
        String::from_utf8(data).map_err(|_| Error::BadPayload(child_path))
    }
}
