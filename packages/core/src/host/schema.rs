//! Environment and host configuration schema
//!
//! Data structures for storing deployment environments and their hosts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::chain;
use super::error::HostError;

/// Default SSH port when a host does not specify one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Configuration for a remote host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// SSH hostname or IP address
    pub hostname: String,

    /// SSH username (default: current user from whoami)
    #[serde(default = "default_user")]
    pub user: String,

    /// SSH port (default: 22)
    #[serde(default)]
    pub port: Option<u16>,

    /// Path to SSH identity file (private key)
    #[serde(default)]
    pub identity_file: Option<String>,

    /// Password for hosts without key-based auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Name of another host in the same environment this one is reached through
    #[serde(default)]
    pub tunnel_host: Option<String>,

    /// Extra `-o` options for the SSH client, applied after the defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_ssh_options: BTreeMap<String, String>,

    /// Remote directory to `cd` into before running commands
    #[serde(default)]
    pub ssh_home_folder: Option<String>,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_user() -> String {
    whoami::username()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            user: default_user(),
            port: None,
            identity_file: None,
            password: None,
            tunnel_host: None,
            additional_ssh_options: BTreeMap::new(),
            ssh_home_folder: None,
            description: None,
        }
    }
}

impl HostConfig {
    /// Create a new host config with just hostname
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: set user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder pattern: set identity file
    pub fn with_identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Builder pattern: set password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Builder pattern: reach this host through another host
    pub fn with_tunnel_host(mut self, name: impl Into<String>) -> Self {
        self.tunnel_host = Some(name.into());
        self
    }

    /// Builder pattern: add an SSH client option
    pub fn with_ssh_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_ssh_options.insert(key.into(), value.into());
        self
    }

    /// Builder pattern: set remote working directory
    pub fn with_home_folder(mut self, dir: impl Into<String>) -> Self {
        self.ssh_home_folder = Some(dir.into());
        self
    }

    /// SSH port, falling back to 22
    pub fn ssh_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SSH_PORT)
    }

    /// Password, treating an empty string as absent
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Identity file with a leading `~/` expanded to the home directory
    pub fn identity_path(&self) -> Option<String> {
        let key = self.identity_file.as_deref().filter(|k| !k.is_empty())?;
        match (key.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => Some(home.join(rest).to_string_lossy().into_owned()),
            _ => Some(key.to_string()),
        }
    }
}

/// A deployment environment (production, staging, ...) and its hosts
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Value exported as APPLICATION_ENV (default: the environment name)
    #[serde(default)]
    pub application_env: Option<String>,

    /// Host used when a command does not name one
    #[serde(default)]
    pub default_host: Option<String>,

    /// Map of host name to configuration
    #[serde(default)]
    pub hosts: BTreeMap<String, HostConfig>,
}

impl EnvironmentConfig {
    /// Builder pattern: add a host
    pub fn with_host(mut self, name: impl Into<String>, host: HostConfig) -> Self {
        self.hosts.insert(name.into(), host);
        self
    }

    /// Builder pattern: set application env
    pub fn with_application_env(mut self, value: impl Into<String>) -> Self {
        self.application_env = Some(value.into());
        self
    }

    /// APPLICATION_ENV value for an environment registered under `name`
    pub fn application_env_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.application_env.as_deref().unwrap_or(name)
    }

    /// Get a host by name
    pub fn get_host(&self, name: &str) -> Option<&HostConfig> {
        self.hosts.get(name)
    }

    /// Pick a host: the requested one, the default, or the only one
    pub fn select_host<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, HostError> {
        if let Some(name) = requested.or(self.default_host.as_deref()) {
            return if self.hosts.contains_key(name) {
                Ok(name)
            } else {
                Err(HostError::NotFound(name.to_string()))
            };
        }

        let mut names = self.hosts.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.as_str()),
            (None, _) => Err(HostError::InvalidConfig(
                "Environment has no hosts".to_string(),
            )),
            (Some(_), Some(_)) => Err(HostError::InvalidConfig(
                "Environment has several hosts; pick one with --host".to_string(),
            )),
        }
    }

    /// Resolve the ordered tunnel chain for a host: `[host, parent, ..., root]`
    pub fn tunnel_chain<'a>(&'a self, name: &str) -> Result<Vec<(&'a str, &'a HostConfig)>, HostError> {
        chain::resolve_chain(&self.hosts, name)
    }
}

/// Root structure for environments.json file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentsFile {
    /// Schema version for future migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Environment used when a command does not name one
    #[serde(default)]
    pub default_environment: Option<String>,

    /// Map of environment name to configuration
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

fn default_version() -> u32 {
    1
}

impl EnvironmentsFile {
    /// Create empty environments file
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Default::default()
        }
    }

    /// Add an environment
    pub fn add_environment(&mut self, name: impl Into<String>, env: EnvironmentConfig) {
        self.environments.insert(name.into(), env);
    }

    /// Get an environment by name
    pub fn get_environment(&self, name: &str) -> Result<&EnvironmentConfig, HostError> {
        self.environments
            .get(name)
            .ok_or_else(|| HostError::EnvironmentNotFound(name.to_string()))
    }

    /// Get list of environment names
    pub fn environment_names(&self) -> Vec<&str> {
        self.environments.keys().map(|s| s.as_str()).collect()
    }

    /// Check every host's tunnel chain resolves without cycles
    pub fn validate(&self) -> Result<(), HostError> {
        for (env_name, env) in &self.environments {
            if let Some(default) = &env.default_host {
                if !env.hosts.contains_key(default) {
                    return Err(HostError::InvalidConfig(format!(
                        "Environment '{env_name}' has unknown default host '{default}'"
                    )));
                }
            }
            for (host_name, host) in &env.hosts {
                if host.hostname.is_empty() {
                    return Err(HostError::InvalidConfig(format!(
                        "Host '{host_name}' in environment '{env_name}' has no hostname"
                    )));
                }
                env.tunnel_chain(host_name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_defaults() {
        let config = HostConfig::default();
        assert!(config.hostname.is_empty());
        assert!(!config.user.is_empty()); // Should be current user
        assert_eq!(config.ssh_port(), 22);
        assert!(config.identity_file.is_none());
        assert!(config.password().is_none());
        assert!(config.tunnel_host.is_none());
        assert!(config.additional_ssh_options.is_empty());
    }

    #[test]
    fn test_host_config_builder() {
        let config = HostConfig::new("web1.example.com")
            .with_user("deploy")
            .with_port(2222)
            .with_identity_file("/keys/deploy")
            .with_tunnel_host("bastion")
            .with_home_folder("/var/www");

        assert_eq!(config.hostname, "web1.example.com");
        assert_eq!(config.user, "deploy");
        assert_eq!(config.ssh_port(), 2222);
        assert_eq!(config.identity_path().as_deref(), Some("/keys/deploy"));
        assert_eq!(config.tunnel_host.as_deref(), Some("bastion"));
        assert_eq!(config.ssh_home_folder.as_deref(), Some("/var/www"));
    }

    #[test]
    fn test_empty_password_is_absent() {
        let config = HostConfig::new("h").with_password("");
        assert!(config.password().is_none());
    }

    #[test]
    fn test_identity_path_expands_home() {
        let config = HostConfig::new("h").with_identity_file("~/.ssh/id_ed25519");
        let path = config.identity_path().unwrap();
        assert!(!path.starts_with('~'));
        assert!(path.ends_with(".ssh/id_ed25519"));
    }

    #[test]
    fn test_application_env_defaults_to_name() {
        let env = EnvironmentConfig::default();
        assert_eq!(env.application_env_for("staging"), "staging");

        let env = env.with_application_env("stage");
        assert_eq!(env.application_env_for("staging"), "stage");
    }

    #[test]
    fn test_select_host() {
        let env = EnvironmentConfig::default().with_host("web", HostConfig::new("w"));
        assert_eq!(env.select_host(None).unwrap(), "web");
        assert!(matches!(
            env.select_host(Some("db")),
            Err(HostError::NotFound(_))
        ));

        let env = env.with_host("db", HostConfig::new("d"));
        assert!(env.select_host(None).is_err());
        assert_eq!(env.select_host(Some("db")).unwrap(), "db");
    }

    #[test]
    fn test_validate_rejects_missing_tunnel_host() {
        let mut file = EnvironmentsFile::new();
        file.add_environment(
            "production",
            EnvironmentConfig::default()
                .with_host("web", HostConfig::new("w").with_tunnel_host("bastion")),
        );
        assert!(matches!(
            file.validate(),
            Err(HostError::UnknownTunnelHost { .. })
        ));
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{
            "environments": {
                "production": {
                    "hosts": { "web": { "hostname": "web.example.com", "user": "deploy" } }
                }
            }
        }"#;
        let file: EnvironmentsFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.version, 1);
        let env = file.get_environment("production").unwrap();
        let host = env.get_host("web").unwrap();
        assert_eq!(host.user, "deploy");
        assert_eq!(host.ssh_port(), 22);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let json = r#"{"hostname": "h", "jump": "x"}"#;
        assert!(serde_json::from_str::<HostConfig>(json).is_err());
    }
}
