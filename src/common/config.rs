//! Configuration for minielect

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::common::{Error, Result};

/// Election client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Coordination service endpoints (host:port)
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Session timeout in milliseconds, owned by the coordination service
    #[serde(default = "default_session_timeout")]
    pub session_timeout_ms: u64,

    /// Service group this process competes in
    #[serde(default = "default_group")]
    pub group: String,

    /// Poll interval for the candidate worker loop, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_endpoints() -> Vec<String> {
    vec![
        "zoo1:2181".to_string(),
        "zoo2:2181".to_string(),
        "zoo3:2181".to_string(),
    ]
}
fn default_session_timeout() -> u64 {
    10_000
}
fn default_group() -> String {
    "WorkerService".to_string()
}
fn default_poll_interval() -> u64 {
    10_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            session_timeout_ms: default_session_timeout(),
            group: default_group(),
            poll_interval_ms: default_poll_interval(),
            log_level: default_log_level(),
        }
    }
}

impl ElectionConfig {
    /// Load from a TOML file; missing file yields defaults, a malformed one errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(Error::InvalidConfig("no endpoints configured".into()));
        }
        if self.group.is_empty() || self.group.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "invalid group name: {:?}",
                self.group
            )));
        }
        if self.session_timeout_ms == 0 {
            return Err(Error::InvalidConfig("session timeout must be > 0".into()));
        }
        Ok(())
    }

    /// Connect string in the usual comma-separated form
    pub fn connect_string(&self) -> String {
        self.endpoints.join(",")
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ElectionConfig::default();
        assert_eq!(config.session_timeout_ms, 10_000);
        assert_eq!(config.connect_string(), "zoo1:2181,zoo2:2181,zoo3:2181");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: ElectionConfig =
            toml::from_str("group = \"billing\"\nsession_timeout_ms = 5000\n").unwrap();
        assert_eq!(config.group, "billing");
        assert_eq!(config.session_timeout_ms, 5000);
        assert_eq!(config.endpoints.len(), 3);
    }

    #[test]
    fn test_rejects_bad_group() {
        let config = ElectionConfig {
            group: "a/b".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
