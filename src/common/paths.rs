//! Namespace path helpers
//!
//! The election namespace is fixed:
//! - `/ELECTION` — persistent root
//! - `/ELECTION/<group>` — persistent, one per service group
//! - `/ELECTION/<group>/n_<sequence>` — ephemeral-sequential, one per live candidate

use crate::common::{Error, Result};

/// Persistent root of the election namespace
pub const ELECTION_ROOT: &str = "/ELECTION";

/// Prefix of candidate membership nodes; the service appends the sequence suffix
pub const MEMBER_PREFIX: &str = "n_";

/// Width of the zero-padded sequence suffix
pub const SEQUENCE_WIDTH: usize = 10;

/// Path of a service group node
pub fn group_path(group: &str) -> String {
    format!("{}/{}", ELECTION_ROOT, group)
}

/// Path prefix for a new membership node under a group
pub fn member_prefix_path(group: &str) -> String {
    format!("{}/{}", group_path(group), MEMBER_PREFIX)
}

/// Join a parent path and a child name
pub fn join(parent: &str, child: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

/// Parent of a path, or None for the root
pub fn parent_of(path: &str) -> Option<&str> {
    let idx = path.rfind('/')?;
    if idx == 0 {
        if path.len() > 1 {
            Some("/")
        } else {
            None
        }
    } else {
        Some(&path[..idx])
    }
}

/// Last component of a path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Validate an absolute namespace path
pub fn validate(path: &str) -> Result<()> {
    if !path.starts_with('/') || (path.len() > 1 && path.ends_with('/')) || path.contains("//") {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Parse the sequence suffix of a membership node name (`n_0000000003` -> 3)
pub fn sequence_of(name: &str) -> Option<u64> {
    name.strip_prefix(MEMBER_PREFIX)?.parse().ok()
}

/// Render a sequence number into a zero-padded node name
pub fn member_name(sequence: u64) -> String {
    format!("{}{:0width$}", MEMBER_PREFIX, sequence, width = SEQUENCE_WIDTH)
}
