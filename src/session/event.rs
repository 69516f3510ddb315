//! Watch events delivered by the coordination service

/// Event classes a watcher can receive.
///
/// `None` carries no path and signals a session-state transition; the node
/// events carry the path the one-shot watch was armed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    None,
    NodeCreated,
    NodeDeleted,
    NodeDataChanged,
    NodeChildrenChanged,
}

/// Session lifecycle states reported alongside `EventKind::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Disconnected,
    Expired,
}

impl SessionState {
    /// Both drop and expiry invalidate the ephemeral nodes the session owned.
    pub fn is_lost(&self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::Expired)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connected => write!(f, "connected"),
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Expired => write!(f, "expired"),
        }
    }
}

/// A single watch notification.
#[derive(Debug, Clone)]
pub struct WatchedEvent {
    pub kind: EventKind,
    pub state: SessionState,
    /// Set for node events, absent for session-state transitions
    pub path: Option<String>,
}

impl WatchedEvent {
    pub fn node_deleted(path: impl Into<String>) -> Self {
        Self {
            kind: EventKind::NodeDeleted,
            state: SessionState::Connected,
            path: Some(path.into()),
        }
    }

    pub fn session(state: SessionState) -> Self {
        Self {
            kind: EventKind::None,
            state,
            path: None,
        }
    }
}
