//! deltacli-core - Core library for deltacli
//!
//! Environments and hosts, SSH tunnel orchestration through chains of
//! intermediate hosts, and assembly of remote `ssh` command lines.

pub mod config;
pub mod host;
pub mod version;

pub use config::{Config, load_config, load_config_from};
pub use host::{
    EnvironmentConfig, EnvironmentsFile, HostConfig, HostError, PasswordRelay, RemoteCommand,
    SshTunnel, TunnelSettings, load_environments_from, save_environments_to,
};
pub use version::{get_version, get_version_long};
