//! Configuration schema for deltacli
//!
//! Defines the structure and defaults for the config.json file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::host::{PasswordRelay, TunnelSettings};

/// Main configuration structure for deltacli
///
/// Serialized to/from `~/.config/deltacli/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Config file version for migrations
    pub version: u32,

    /// SSH client binary (default: "ssh")
    #[serde(default = "default_ssh_binary")]
    pub ssh_binary: String,

    /// Force non-interactive key-only auth (default: true)
    #[serde(default = "default_batch_mode")]
    pub batch_mode: bool,

    /// Seconds to wait for a tunnel to accept connections (default: 30)
    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,

    /// Milliseconds between tunnel readiness probes (default: 50)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Connect timeout of a single port probe in milliseconds (default: 250)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Random local ports tried before giving up (default: 100)
    #[serde(default = "default_port_allocation_attempts")]
    pub port_allocation_attempts: u32,

    /// How password-authenticated hosts receive their password
    /// {"mode": "sshpass"} - sshpass -e, password in the environment (default)
    /// {"mode": "expect", "script": "/path/ssh-with-password.exp"} - legacy helper
    #[serde(default)]
    pub password_relay: PasswordRelay,

    /// Environment used when a command does not name one
    #[serde(default)]
    pub default_environment: Option<String>,
}

fn default_ssh_binary() -> String {
    "ssh".to_string()
}

fn default_batch_mode() -> bool {
    true
}

fn default_readiness_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_probe_timeout_ms() -> u64 {
    250
}

fn default_port_allocation_attempts() -> u32 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            ssh_binary: default_ssh_binary(),
            batch_mode: default_batch_mode(),
            readiness_timeout_secs: default_readiness_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            port_allocation_attempts: default_port_allocation_attempts(),
            password_relay: PasswordRelay::default(),
            default_environment: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Tunnel timing and client settings derived from this config
    ///
    /// Zero intervals are bumped to 1ms so polling never spins.
    pub fn tunnel_settings(&self) -> TunnelSettings {
        TunnelSettings {
            ssh_binary: self.ssh_binary.clone(),
            readiness_timeout: Duration::from_secs(self.readiness_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms.max(1)),
            port_allocation_attempts: self.port_allocation_attempts.max(1),
            password_relay: self.password_relay.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.ssh_binary, "ssh");
        assert!(config.batch_mode);
        assert_eq!(config.readiness_timeout_secs, 30);
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.probe_timeout_ms, 250);
        assert_eq!(config.password_relay, PasswordRelay::Sshpass);
        assert!(config.default_environment.is_none());
    }

    #[test]
    fn test_defaults_match_tunnel_settings() {
        assert_eq!(Config::default().tunnel_settings(), TunnelSettings::default());
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let json = r#"{"version": 1}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_deserialize_expect_relay() {
        let json = r#"{
            "version": 1,
            "readiness_timeout_secs": 5,
            "password_relay": {"mode": "expect", "script": "/opt/ssh-with-password.exp"}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let settings = config.tunnel_settings();
        assert_eq!(settings.readiness_timeout, Duration::from_secs(5));
        assert_eq!(
            settings.password_relay,
            PasswordRelay::Expect {
                script: "/opt/ssh-with-password.exp".to_string()
            }
        );
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tunnel_settings().poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"version": 1, "ssh_port": 22}"#;
        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
