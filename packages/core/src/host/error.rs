//! Host-specific error types
//!
//! Errors that can occur while resolving hosts and driving SSH tunnels.

use thiserror::Error;

/// Errors that can occur during host operations
#[derive(Error, Debug)]
pub enum HostError {
    /// Failed to spawn the SSH client (or the password relay wrapping it)
    #[error("Failed to spawn SSH: {0}")]
    SshSpawn(String),

    /// Forwarder never became reachable, or died right after it did
    #[error("SSH tunnel to host '{host}' failed: {reason}")]
    TunnelConnectionFailure { host: String, reason: String },

    /// Host not found in its environment
    #[error("Host not found: {0}")]
    NotFound(String),

    /// Environment not found in environments.json
    #[error("Environment not found: {0}")]
    EnvironmentNotFound(String),

    /// A host names a tunnel host that does not exist
    #[error("Host '{host}' uses unknown tunnel host '{tunnel_host}'")]
    UnknownTunnelHost { host: String, tunnel_host: String },

    /// Tunnel hosts reference each other in a loop
    #[error("Tunnel host cycle detected: {}", .0.join(" -> "))]
    TunnelCycle(Vec<String>),

    /// Chain of tunnel hosts is longer than we are willing to follow
    #[error("Tunnel chain for host '{host}' exceeds {max} hops")]
    ChainTooDeep { host: String, max: usize },

    /// Failed to allocate local port for tunnel
    #[error("Failed to allocate local port: {0}")]
    PortAllocation(String),

    /// Failed to load environments file
    #[error("Failed to load environments file: {0}")]
    LoadFailed(String),

    /// Failed to save environments file
    #[error("Failed to save environments file: {0}")]
    SaveFailed(String),

    /// Invalid host configuration
    #[error("Invalid host configuration: {0}")]
    InvalidConfig(String),
}

impl HostError {
    /// Shorthand for a tunnel failure attributed to `host`
    pub(crate) fn tunnel_failure(host: &str, reason: impl Into<String>) -> Self {
        HostError::TunnelConnectionFailure {
            host: host.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the host a tunnel failure is attributed to, if any
    pub fn failed_host(&self) -> Option<&str> {
        match self {
            HostError::TunnelConnectionFailure { host, .. } => Some(host),
            HostError::NotFound(host) => Some(host),
            HostError::UnknownTunnelHost { host, .. } => Some(host),
            HostError::ChainTooDeep { host, .. } => Some(host),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunnel_failure_message_names_host() {
        let err = HostError::tunnel_failure("db-proxy", "Timed out waiting for SSH tunnel to open");
        assert_eq!(
            err.to_string(),
            "SSH tunnel to host 'db-proxy' failed: Timed out waiting for SSH tunnel to open"
        );
        assert_eq!(err.failed_host(), Some("db-proxy"));
    }

    #[test]
    fn cycle_message_lists_path() {
        let err = HostError::TunnelCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "Tunnel host cycle detected: a -> b -> a");
        assert!(err.failed_host().is_none());
    }
}
